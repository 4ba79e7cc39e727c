//! Rate solvers: RATE, IRR, XIRR.
//!
//! All three run Newton-Raphson through [`crate::solver::solve`], bounded by
//! the pass solver configuration. Rate equations are undefined at `r <= -1`;
//! undefined points fall back to guesses walking down towards -1.

use once_cell::sync::Lazy;
use rangecalc_common::{CellError, CellValue, FunctionResult};

use crate::args::{self, ArgSchema};
use crate::builtins::utils::{finite, numbers_in_view};
use crate::engine::EvaluationPass;
use crate::function::Function;
use crate::solver::{rate_fallback, solve};
use crate::traits::{ArgValue, CalcValue};

const PERCENT: &str = "0%";

/// Below this magnitude the annuity factor uses its limit at zero.
const RATE_EPSILON: f64 = 1e-10;

fn percent<'a>(rate: f64) -> Result<CalcValue<'a>, CellError> {
    Ok(CalcValue::Scalar(
        FunctionResult::new(CellValue::Number(finite(rate)?)).with_format(PERCENT),
    ))
}

/// Annuity residual `pv(1+r)^n + pmt(1+r·t)((1+r)^n - 1)/r + fv` and its
/// derivative in `r`.
#[derive(Debug, Clone, Copy)]
pub struct Annuity {
    pub nper: f64,
    pub pmt: f64,
    pub pv: f64,
    pub fv: f64,
    /// 1 when payments fall at the start of each period.
    pub due: f64,
}

impl Annuity {
    /// `((1+r)^n - 1)/r` and its derivative.
    fn factor(&self, r: f64) -> (f64, f64) {
        let n = self.nper;
        if r.abs() < RATE_EPSILON {
            return (n, n * (n - 1.0) / 2.0);
        }
        let grown = (1.0 + r).powf(n);
        let g = (grown - 1.0) / r;
        let dg = (n * (1.0 + r).powf(n - 1.0) * r - (grown - 1.0)) / (r * r);
        (g, dg)
    }

    pub fn residual(&self, r: f64) -> Option<f64> {
        if r <= -1.0 {
            return None;
        }
        let (g, _) = self.factor(r);
        Some(self.pv * (1.0 + r).powf(self.nper) + self.pmt * (1.0 + r * self.due) * g + self.fv)
    }

    pub fn derivative(&self, r: f64) -> Option<f64> {
        if r <= -1.0 {
            return None;
        }
        let n = self.nper;
        let (g, dg) = self.factor(r);
        Some(
            self.pv * n * (1.0 + r).powf(n - 1.0)
                + self.pmt * (self.due * g + (1.0 + r * self.due) * dg),
        )
    }
}

#[derive(Debug)]
pub struct RateFn;

/// RATE(number_of_periods, payment_per_period, present_value,
/// [future_value=0], [end_or_beginning=0], [rate_guess=0.1])
impl Function for RateFn {
    crate::func_caps!(PURE, NUMERIC_ONLY, ITERATIVE);
    fn name(&self) -> &'static str {
        "RATE"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            vec![
                ArgSchema::number_lenient_scalar(),
                ArgSchema::number_lenient_scalar(),
                ArgSchema::number_lenient_scalar(),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(0.0)),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(0.0)),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(0.1)),
            ]
        });
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let locale = *pass.locale();
        let nper = args::number(args, 0, &locale)?;
        if nper <= 0.0 {
            return Err(CellError::new_num()
                .with_message("Number of periods must be positive")
                .with_argument(0));
        }
        let annuity = Annuity {
            nper,
            pmt: args::number(args, 1, &locale)?,
            pv: args::number(args, 2, &locale)?,
            fv: args::number_or(args, 3, 0.0, &locale)?,
            due: if args::number_or(args, 4, 0.0, &locale)? != 0.0 { 1.0 } else { 0.0 },
        };
        let guess = args::number_or(args, 5, 0.1, &locale)?;
        let mut fallback = rate_fallback;
        let rate = solve(
            &pass.config().solver,
            |r| annuity.residual(r),
            |r| annuity.derivative(r),
            guess,
            Some(&mut fallback),
        )?;
        percent(rate)
    }
}

/// Cash flows discounted at `(offset_i)` periods: `Σ v_i / (1+r)^offset_i`.
fn npv_at(flows: &[(f64, f64)], r: f64) -> Option<f64> {
    (r > -1.0).then(|| flows.iter().map(|&(v, t)| v / (1.0 + r).powf(t)).sum())
}

fn npv_slope(flows: &[(f64, f64)], r: f64) -> Option<f64> {
    (r > -1.0).then(|| flows.iter().map(|&(v, t)| -t * v / (1.0 + r).powf(t + 1.0)).sum())
}

fn require_sign_change(values: &[f64], name: &str) -> Result<(), CellError> {
    let positive = values.iter().any(|&v| v > 0.0);
    let negative = values.iter().any(|&v| v < 0.0);
    if positive && negative {
        Ok(())
    } else {
        Err(CellError::new_num()
            .with_message(format!("{name} needs at least one positive and one negative cash flow"))
            .with_argument(0))
    }
}

fn solve_flows(flows: &[(f64, f64)], guess: f64, pass: &EvaluationPass) -> Result<f64, CellError> {
    let mut fallback = rate_fallback;
    Ok(solve(
        &pass.config().solver,
        |r| npv_at(flows, r),
        |r| npv_slope(flows, r),
        guess,
        Some(&mut fallback),
    )?)
}

#[derive(Debug)]
pub struct IrrFn;

/// IRR(cashflow_amounts, [rate_guess=0.1]); flows are one period apart.
impl Function for IrrFn {
    crate::func_caps!(PURE, NUMERIC_ONLY, ITERATIVE);
    fn name(&self) -> &'static str {
        "IRR"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            vec![
                ArgSchema::range(),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(0.1)),
            ]
        });
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let values = numbers_in_view(&args::view(args, 0, pass)?)?;
        require_sign_change(&values, "IRR")?;
        let guess = args::number_or(args, 1, 0.1, pass.locale())?;
        let flows: Vec<(f64, f64)> = values.iter().enumerate().map(|(i, &v)| (v, i as f64)).collect();
        percent(solve_flows(&flows, guess, pass)?)
    }
}

#[derive(Debug)]
pub struct XirrFn;

/// XIRR(cashflow_amounts, cashflow_dates, [rate_guess=0.1])
///
/// Dates are serial day numbers; each flow is discounted by
/// `(date - first_date) / 365` years.
impl Function for XirrFn {
    crate::func_caps!(PURE, NUMERIC_ONLY, ITERATIVE);
    fn name(&self) -> &'static str {
        "XIRR"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            vec![
                ArgSchema::range(),
                ArgSchema::range(),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(0.1)),
            ]
        });
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let values = numbers_in_view(&args::view(args, 0, pass)?)?;
        let dates = numbers_in_view(&args::view(args, 1, pass)?)?;
        if values.len() != dates.len() {
            return Err(CellError::new_num()
                .with_message(format!(
                    "XIRR got {} cash flows but {} dates",
                    values.len(),
                    dates.len()
                ))
                .with_argument(1));
        }
        require_sign_change(&values, "XIRR")?;
        let start = dates[0];
        if dates.iter().any(|&d| d < start) {
            return Err(CellError::new_num()
                .with_message("XIRR dates must not precede the first date")
                .with_argument(1));
        }
        let guess = args::number_or(args, 2, 0.1, pass.locale())?;
        let flows: Vec<(f64, f64)> = values
            .iter()
            .zip(&dates)
            .map(|(&v, &d)| (v, (d - start) / 365.0))
            .collect();
        let rate = solve_flows(&flows, guess, pass)?;
        Ok(CalcValue::from(CellValue::Number(finite(rate)?)))
    }
}
