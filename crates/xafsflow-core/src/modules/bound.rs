//! Overlap of the independent-variable domains of every group in a table.

use crate::domain::{GroupKey, XafsResult};
use crate::table::SpectralTable;
use serde::Serialize;

/// Closed interval `[lower, upper]`. `upper < lower` encodes the empty
/// interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundedDomain {
    pub lower: f64,
    pub upper: f64,
}

impl BoundedDomain {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub const fn empty() -> Self {
        Self {
            lower: f64::INFINITY,
            upper: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.lower <= self.upper)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Values of `x` inside the interval, in input order.
    pub fn clip(&self, x: &[f64]) -> Vec<f64> {
        x.iter().copied().filter(|&value| self.contains(value)).collect()
    }

    fn intersect(self, other: Self) -> Self {
        Self {
            lower: self.lower.max(other.lower),
            upper: self.upper.min(other.upper),
        }
    }

    /// Observed `[min, max]` of the finite entries of `values`.
    pub fn observed(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|value| value.is_finite())
            .fold(None, |domain: Option<Self>, value| {
                Some(match domain {
                    Some(domain) => Self::new(domain.lower.min(value), domain.upper.max(value)),
                    None => Self::new(value, value),
                })
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDomain {
    pub key: GroupKey,
    pub domain: BoundedDomain,
}

/// Observed domain of `domain_column` for each partition of `group_keys`.
/// Partitions without a finite value are left out.
pub fn group_domains(
    table: &SpectralTable,
    domain_column: &str,
    group_keys: &[String],
) -> XafsResult<Vec<GroupDomain>> {
    let values = table.float_column(domain_column)?;
    let partitions = table.partition(group_keys)?;

    Ok(partitions
        .into_iter()
        .filter_map(|partition| {
            let domain = BoundedDomain::observed(partition.rows.iter().map(|&row| values[row]))?;
            Some(GroupDomain {
                key: partition.key,
                domain,
            })
        })
        .collect())
}

/// `[max of group minimums, min of group maximums]`.
pub fn bounded_domain(
    table: &SpectralTable,
    domain_column: &str,
    group_keys: &[String],
) -> XafsResult<BoundedDomain> {
    let domains = group_domains(table, domain_column, group_keys)?;
    let mut domains = domains.into_iter().map(|group| group.domain);
    let Some(first) = domains.next() else {
        return Ok(BoundedDomain::empty());
    };
    let bounded = domains.fold(first, BoundedDomain::intersect);
    tracing::debug!(
        lower = bounded.lower,
        upper = bounded.upper,
        "bounded {} domain",
        domain_column
    );
    Ok(bounded)
}

/// Values of `x` within the domain shared by every group, inclusive at both
/// ends. A non-overlapping table yields an empty result.
pub fn bound_x_values(
    x: &[f64],
    table: &SpectralTable,
    domain_column: &str,
    group_keys: &[String],
) -> XafsResult<Vec<f64>> {
    Ok(bounded_domain(table, domain_column, group_keys)?.clip(x))
}
