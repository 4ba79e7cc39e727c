mod caps_macro;
mod registry_macro;
