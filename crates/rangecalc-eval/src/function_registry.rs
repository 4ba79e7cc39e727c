use crate::function::Function;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Functions by upper-case name (aliases included).
static REG: Lazy<DashMap<String, Arc<dyn Function>>> = Lazy::new(DashMap::new);

pub fn register(f: Arc<dyn Function>) {
    for alias in f.aliases() {
        REG.insert(alias.to_ascii_uppercase(), Arc::clone(&f));
    }
    REG.insert(f.name().to_ascii_uppercase(), f);
}

/// Case-insensitive lookup.
pub fn get(name: &str) -> Option<Arc<dyn Function>> {
    REG.get(&name.to_ascii_uppercase())
        .map(|v| Arc::clone(v.value()))
}

/// Registered names, sorted.
pub fn names() -> Vec<String> {
    let mut out: Vec<String> = REG.iter().map(|e| e.key().clone()).collect();
    out.sort();
    out
}
