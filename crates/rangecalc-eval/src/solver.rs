//! Newton-Raphson root finding for iterative functions (RATE, IRR, XIRR).

use rangecalc_common::CellError;

use crate::engine::SolverConfig;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("no convergence after {iterations} iterations")]
    NoConvergence { iterations: usize },
}

impl From<SolveError> for CellError {
    fn from(e: SolveError) -> Self {
        CellError::new_eval().with_message(format!("No result found ({e})"))
    }
}

/// Fallback guesses walking towards -1 from above: -0.9, -0.99, -0.999, ...
///
/// Suits rate equations, which are undefined for `x <= -1`.
pub fn rate_fallback(previous: Option<f64>) -> f64 {
    match previous {
        None => -0.9,
        Some(p) => -1.0 + (p + 1.0) / 10.0,
    }
}

/// Find a root of `f` starting from `x0`.
///
/// `f`/`df` return `None` where they are undefined. An undefined value, a zero
/// derivative or a non-finite step asks `on_undefined` for a substitute guess
/// (it receives its own previous answer), which costs one iteration; without
/// a fallback the search fails right away. Converges when `|Δx| < epsilon` or
/// `|f(x)| < epsilon`.
pub fn newton_raphson<F, DF>(
    mut f: F,
    mut df: DF,
    x0: f64,
    max_iter: usize,
    epsilon: f64,
    mut on_undefined: Option<&mut dyn FnMut(Option<f64>) -> f64>,
) -> Result<f64, SolveError>
where
    F: FnMut(f64) -> Option<f64>,
    DF: FnMut(f64) -> Option<f64>,
{
    let mut x = x0;
    let mut last_fallback: Option<f64> = None;
    for iteration in 1..=max_iter {
        let fx = f(x).filter(|v| v.is_finite());
        if let Some(fx) = fx
            && fx.abs() < epsilon
        {
            return Ok(x);
        }
        let next = match (fx, df(x).filter(|v| v.is_finite())) {
            (Some(fx), Some(dfx)) if dfx != 0.0 => Some(x - fx / dfx).filter(|n| n.is_finite()),
            _ => None,
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(iteration, x, ?fx, ?next, "newton step");
        match next {
            Some(n) if (n - x).abs() < epsilon => return Ok(n),
            Some(n) => x = n,
            None => match on_undefined.as_mut() {
                Some(fallback) => {
                    let guess = fallback(last_fallback);
                    last_fallback = Some(guess);
                    x = guess;
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(iteration, x, "newton-raphson hit an undefined point");
                    return Err(SolveError::NoConvergence { iterations: iteration });
                }
            },
        }
    }
    #[cfg(feature = "tracing")]
    tracing::warn!(max_iter, x, "newton-raphson did not converge");
    Err(SolveError::NoConvergence {
        iterations: max_iter,
    })
}

/// [`newton_raphson`] with iteration limits taken from the pass configuration.
pub fn solve<F, DF>(
    config: &SolverConfig,
    f: F,
    df: DF,
    x0: f64,
    on_undefined: Option<&mut dyn FnMut(Option<f64>) -> f64>,
) -> Result<f64, SolveError>
where
    F: FnMut(f64) -> Option<f64>,
    DF: FnMut(f64) -> Option<f64>,
{
    newton_raphson(f, df, x0, config.max_iterations, config.epsilon, on_undefined)
}
