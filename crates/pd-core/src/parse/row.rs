//! Typed parsing and invariant checks for one input row.
//!
//! Numbers are read as floats first; count fields must then be exact
//! non-negative integers. Empty cells are only accepted where the publisher's
//! zero rule allows them. Any failure is fatal for the whole input.

use csv::StringRecord;
use pd_common::{parse_date, Error, Record, Result, RowSnapshot, ScaleFactor, StratumKey, StratumValues};
use pd_config::{ColumnSchema, DigestConfig, UFractionCheck};
use pd_math::{approx_eq, exact_u64};

/// Column positions resolved once from the header row.
#[derive(Debug, Clone)]
struct ColumnIndex {
    date: usize,
    region: usize,
    utla: usize,
    district: usize,
    age_group: usize,
    imd: usize,
    respondent_count: usize,
    unhealthy_count: usize,
    unhealthy_unknown_count: usize,
    predicted_positive_count: usize,
    predicted_positive_probability: usize,
    population: usize,
    corrected_positive_estimate: usize,
    corrected_positive_probability: usize,
    scale_factor: usize,
    scale_factor_probability: usize,
    sub_area: Option<usize>,
}

impl ColumnIndex {
    fn resolve(schema: &ColumnSchema, headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
                Error::Schema(format!(
                    "layout '{}' requires column '{}' which is absent",
                    schema.name, name
                ))
            })
        };
        let k = &schema.keys;
        let v = &schema.values;
        Ok(Self {
            date: find(k.date)?,
            region: find(k.region)?,
            utla: find(k.utla)?,
            district: find(k.district)?,
            age_group: find(k.age_group)?,
            imd: find(k.imd)?,
            respondent_count: find(v.respondent_count)?,
            unhealthy_count: find(v.unhealthy_count)?,
            unhealthy_unknown_count: find(v.unhealthy_unknown_count)?,
            predicted_positive_count: find(v.predicted_positive_count)?,
            predicted_positive_probability: find(v.predicted_positive_probability)?,
            population: find(v.population)?,
            corrected_positive_estimate: find(v.corrected_positive_estimate)?,
            corrected_positive_probability: find(v.corrected_positive_probability)?,
            scale_factor: find(v.scale_factor)?,
            scale_factor_probability: find(v.scale_factor_probability)?,
            sub_area: schema.sub_area.map(find).transpose()?,
        })
    }
}

/// Converts raw rows of one file into validated records.
#[derive(Debug, Clone)]
pub struct RowParser {
    schema: &'static ColumnSchema,
    index: ColumnIndex,
    headers: Vec<String>,
    tolerance: f64,
    u_fraction_check: Option<UFractionCheck>,
}

impl RowParser {
    pub fn new(
        schema: &'static ColumnSchema,
        headers: &StringRecord,
        config: &DigestConfig,
    ) -> Result<Self> {
        Ok(Self {
            schema,
            index: ColumnIndex::resolve(schema, headers)?,
            headers: headers.iter().map(str::to_string).collect(),
            tolerance: config.tolerance,
            u_fraction_check: config.u_fraction_check.clone(),
        })
    }

    pub fn schema(&self) -> &'static ColumnSchema {
        self.schema
    }

    /// Parse and validate one row. `line` is the 1-based line in the source file.
    pub fn parse(&self, line: u64, row: &StringRecord) -> Result<Record> {
        let cx = RowContext {
            parser: self,
            line,
            row,
        };
        let key = cx.key()?;
        let values = cx.values(&key)?;
        Ok(Record { line, key, values })
    }
}

struct RowContext<'p, 'r> {
    parser: &'p RowParser,
    line: u64,
    row: &'r StringRecord,
}

impl RowContext<'_, '_> {
    fn raw(&self, idx: usize) -> &str {
        self.row.get(idx).unwrap_or("").trim()
    }

    fn snapshot(&self) -> RowSnapshot {
        RowSnapshot(
            self.parser
                .headers
                .iter()
                .zip(self.row.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect(),
        )
    }

    fn format_error(&self, idx: usize, detail: impl Into<String>) -> Error {
        Error::Format {
            line: self.line,
            field: self.parser.headers.get(idx).cloned().unwrap_or_default(),
            detail: detail.into(),
            row: self.snapshot(),
        }
    }

    fn violation(&self, key: &StratumKey, invariant: impl Into<String>) -> Error {
        Error::InvariantViolation {
            line: self.line,
            key: Box::new(key.clone()),
            invariant: invariant.into(),
            row: self.snapshot(),
        }
    }

    fn text(&self, idx: usize) -> Result<String> {
        let raw = self.raw(idx);
        if raw.is_empty() {
            return Err(self.format_error(idx, "missing value"));
        }
        Ok(raw.to_string())
    }

    fn key(&self) -> Result<StratumKey> {
        let ix = &self.parser.index;
        let date_raw = self.text(ix.date)?;
        let date = parse_date(&date_raw)
            .ok_or_else(|| self.format_error(ix.date, format!("'{}' is not a date", date_raw)))?;
        Ok(StratumKey {
            date,
            region: self.text(ix.region)?,
            utla: self.text(ix.utla)?,
            district: self.text(ix.district)?,
            age_group: self.text(ix.age_group)?,
            imd: self.text(ix.imd)?,
        })
    }

    fn number(&self, idx: usize) -> Result<f64> {
        let raw = self.raw(idx);
        if raw.is_empty() {
            return Err(self.format_error(idx, "missing value"));
        }
        raw.parse::<f64>()
            .map_err(|_| self.format_error(idx, format!("'{}' is not a number", raw)))
    }

    fn count(&self, idx: usize) -> Result<u64> {
        let value = self.number(idx)?;
        exact_u64(value).ok_or_else(|| {
            self.format_error(idx, format!("{} is not a non-negative integer", value))
        })
    }

    fn amount(&self, idx: usize) -> Result<f64> {
        let value = self.number(idx)?;
        if !value.is_finite() || value < 0.0 {
            return Err(self.format_error(idx, format!("{} is not a finite value >= 0", value)));
        }
        Ok(value)
    }

    fn scale(&self, idx: usize) -> Result<ScaleFactor> {
        let value = self.number(idx)?;
        if value == f64::INFINITY {
            return Ok(ScaleFactor::Undefined);
        }
        if !value.is_finite() || value <= 0.0 {
            return Err(self.format_error(idx, format!("{} is not a positive scale factor", value)));
        }
        Ok(ScaleFactor::Value(value))
    }

    /// A field forced to zero when `zeroed` holds; must then be empty or zero.
    fn zero_rule(&self, key: &StratumKey, idx: usize, zeroed: bool, why: &str) -> Result<f64> {
        if !zeroed {
            return self.amount(idx);
        }
        if self.raw(idx).is_empty() {
            return Ok(0.0);
        }
        let value = self.number(idx)?;
        if value != 0.0 {
            let field = self.parser.headers.get(idx).map(String::as_str).unwrap_or("?");
            return Err(self.violation(
                key,
                format!("{} must be empty when {}, got {}", field, why, value),
            ));
        }
        Ok(0.0)
    }

    fn values(&self, key: &StratumKey) -> Result<StratumValues> {
        let ix = &self.parser.index;
        let tol = self.parser.tolerance;

        let respondent_count = self.count(ix.respondent_count)?;
        let unhealthy_count = self.count(ix.unhealthy_count)?;
        let unhealthy_unknown_count = self.count(ix.unhealthy_unknown_count)?;
        let predicted_positive_count = self.count(ix.predicted_positive_count)?;
        let predicted_positive_probability = self.amount(ix.predicted_positive_probability)?;
        let population = self.count(ix.population)?;

        let containment = [
            (respondent_count <= population, "respondent_count <= population"),
            (unhealthy_count <= respondent_count, "unhealthy_count <= respondent_count"),
            (
                unhealthy_unknown_count <= unhealthy_count,
                "unhealthy_unknown_count <= unhealthy_count",
            ),
            (
                predicted_positive_count <= unhealthy_unknown_count,
                "predicted_positive_count <= unhealthy_unknown_count",
            ),
        ];
        if let Some((_, rule)) = containment.iter().find(|(holds, _)| !holds) {
            return Err(self.violation(key, *rule));
        }

        let scale_factor = self.scale(ix.scale_factor)?;
        let scale_factor_probability = self.scale(ix.scale_factor_probability)?;

        let corrected_positive_estimate = self.zero_rule(
            key,
            ix.corrected_positive_estimate,
            unhealthy_unknown_count == 0 || scale_factor.is_undefined(),
            "unhealthy_unknown_count is 0 or the scale factor is undefined",
        )?;
        let corrected_positive_probability = self.zero_rule(
            key,
            ix.corrected_positive_probability,
            unhealthy_unknown_count == 0,
            "unhealthy_unknown_count is 0",
        )?;

        let sub_area_count = ix.sub_area.map(|idx| self.count(idx)).transpose()?;

        let values = StratumValues {
            respondent_count,
            unhealthy_count,
            unhealthy_unknown_count,
            predicted_positive_count,
            predicted_positive_probability,
            population,
            corrected_positive_estimate,
            corrected_positive_probability,
            scale_factor,
            scale_factor_probability,
            sub_area_count,
        };

        if let Some(check) = &self.parser.u_fraction_check {
            if key.date < check.before
                && values.unhealthy_count >= check.min_unhealthy
                && values.u_fraction() < check.min_fraction
            {
                return Err(self.violation(
                    key,
                    format!(
                        "u_fraction {} below {} before {}",
                        values.u_fraction(),
                        check.min_fraction,
                        check.before
                    ),
                ));
            }
        }

        let effective = values.effective_respondents();
        if effective == 0.0 {
            if predicted_positive_probability != 0.0 || corrected_positive_probability != 0.0 {
                return Err(self.violation(
                    key,
                    "probabilities must be 0 when respondent_count * u_fraction is 0",
                ));
            }
        } else {
            let lhs = predicted_positive_probability / effective;
            let rhs = corrected_positive_probability / population as f64;
            if !approx_eq(lhs, rhs, tol) {
                return Err(self.violation(
                    key,
                    format!(
                        "predicted_positive_probability / (respondent_count * u_fraction) = {} \
                         but corrected_positive_probability / population = {}",
                        lhs, rhs
                    ),
                ));
            }
        }

        if predicted_positive_count == 0 || population == 0 {
            if corrected_positive_estimate != 0.0 {
                return Err(self.violation(
                    key,
                    "corrected_positive_estimate must be 0 when predicted_positive_count is 0",
                ));
            }
        } else if let ScaleFactor::Value(factor) = scale_factor {
            let derived = (corrected_positive_estimate / predicted_positive_count as f64)
                * (effective / population as f64);
            if !approx_eq(factor, derived, tol) {
                return Err(self.violation(
                    key,
                    format!(
                        "scale_factor {} differs from derived {}",
                        factor, derived
                    ),
                ));
            }
        }

        Ok(values)
    }
}
