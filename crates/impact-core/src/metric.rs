//! Impact metrics and per-metric records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environmental impact metrics reported for every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Abiotic Depletion Potential for Elements, kg antimony-equivalent
    Adpe,
    /// Global Warming Potential, kg CO2-equivalent
    Gwp,
    /// Primary Energy, megajoules
    Pe,
}

impl Metric {
    /// All metrics, in reporting order
    pub const ALL: [Metric; 3] = [Metric::Adpe, Metric::Gwp, Metric::Pe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Adpe => "adpe",
            Metric::Gwp => "gwp",
            Metric::Pe => "pe",
        }
    }

    /// Unit of the metric value
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Adpe => "kgSbeq",
            Metric::Gwp => "kgCO2eq",
            Metric::Pe => "MJ",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Adpe => "ADPe",
            Metric::Gwp => "GWP",
            Metric::Pe => "PE",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adpe" => Ok(Metric::Adpe),
            "gwp" => Ok(Metric::Gwp),
            "pe" => Ok(Metric::Pe),
            _ => Err(format!("Unknown impact metric: {}", s)),
        }
    }
}

/// One value per impact metric
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerMetric<T> {
    pub adpe: T,
    pub gwp: T,
    pub pe: T,
}

/// Per-metric scalar factors (embodied footprints, electricity conversion)
pub type ImpactFactors = PerMetric<f64>;

impl<T> PerMetric<T> {
    pub const fn new(adpe: T, gwp: T, pe: T) -> Self {
        Self { adpe, gwp, pe }
    }

    /// Build a record by evaluating `f` once per metric
    pub fn from_fn(mut f: impl FnMut(Metric) -> T) -> Self {
        Self {
            adpe: f(Metric::Adpe),
            gwp: f(Metric::Gwp),
            pe: f(Metric::Pe),
        }
    }

    /// Fallible variant of [`PerMetric::from_fn`]; stops at the first error
    pub fn try_from_fn<E>(mut f: impl FnMut(Metric) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            adpe: f(Metric::Adpe)?,
            gwp: f(Metric::Gwp)?,
            pe: f(Metric::Pe)?,
        })
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::Adpe => &self.adpe,
            Metric::Gwp => &self.gwp,
            Metric::Pe => &self.pe,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parsing() {
        assert_eq!("ADPe".parse::<Metric>().unwrap(), Metric::Adpe);
        assert_eq!("gwp".parse::<Metric>().unwrap(), Metric::Gwp);
        assert_eq!("PE".parse::<Metric>().unwrap(), Metric::Pe);
        assert!("co2".parse::<Metric>().is_err());
    }

    #[test]
    fn test_metric_units() {
        assert_eq!(Metric::Adpe.unit(), "kgSbeq");
        assert_eq!(Metric::Gwp.unit(), "kgCO2eq");
        assert_eq!(Metric::Pe.unit(), "MJ");
    }

    #[test]
    fn test_per_metric_lookup() {
        let factors = ImpactFactors::new(0.24, 3000.0, 38000.0);
        assert_eq!(*factors.get(Metric::Adpe), 0.24);
        assert_eq!(*factors.get(Metric::Gwp), 3000.0);
        assert_eq!(*factors.get(Metric::Pe), 38000.0);

        let order: Vec<Metric> = factors.iter().map(|(m, _)| m).collect();
        assert_eq!(order, Metric::ALL.to_vec());
    }

    #[test]
    fn test_try_from_fn_stops_at_first_error() {
        let mut visited = Vec::new();
        let result: Result<PerMetric<u8>, Metric> = PerMetric::try_from_fn(|m| {
            visited.push(m);
            if m == Metric::Gwp {
                Err(m)
            } else {
                Ok(1)
            }
        });
        assert_eq!(result.unwrap_err(), Metric::Gwp);
        assert_eq!(visited, vec![Metric::Adpe, Metric::Gwp]);
    }

    #[test]
    fn test_serde_field_names() {
        let json = serde_json::to_value(ImpactFactors::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(json["adpe"], 1.0);
        assert_eq!(json["gwp"], 2.0);
        assert_eq!(json["pe"], 3.0);
    }
}
