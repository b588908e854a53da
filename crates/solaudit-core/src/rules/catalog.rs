//! Strict rating rules.
//!
//! Each rule is a `(predicate, effect)` pair over the severity buckets and
//! the current star count. Rules are applied left to right and no effect may
//! raise the rating. Order matters: `R-CRIT-02` must come after `R-CRIT-01`
//! so that a zero rating wins over the looser cap.

use serde::{Deserialize, Serialize};

use crate::report::model::Vulnerabilities;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleId {
    #[serde(rename = "R-CRIT-01")]
    CriticalCap,
    #[serde(rename = "R-HIGH-01")]
    HighCap,
    #[serde(rename = "R-CRIT-02")]
    CriticalZero,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::CriticalCap => "R-CRIT-01",
            RuleId::HighCap => "R-HIGH-01",
            RuleId::CriticalZero => "R-CRIT-02",
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RatingRule {
    pub id: RuleId,
    pub title: &'static str,
    pub applies: fn(&Vulnerabilities) -> bool,
    pub effect: fn(u8) -> u8,
}

/// Maximum rating for a contract with any critical finding.
pub const CRITICAL_CAP: u8 = 2;

/// Maximum rating for a contract with any high finding.
pub const HIGH_CAP: u8 = 3;

/// Critical findings beyond this count force a zero rating.
pub const CRITICAL_ZERO_THRESHOLD: usize = 2;

pub const STRICT_POLICY: &[RatingRule] = &[
    RatingRule {
        id: RuleId::CriticalCap,
        title: "Critical findings cap the rating at 2",
        applies: |v| !v.critical.is_empty(),
        effect: |stars| stars.min(CRITICAL_CAP),
    },
    RatingRule {
        id: RuleId::HighCap,
        title: "High findings cap the rating at 3",
        applies: |v| !v.high.is_empty(),
        effect: |stars| stars.min(HIGH_CAP),
    },
    RatingRule {
        id: RuleId::CriticalZero,
        title: "More than two critical findings force a zero rating",
        applies: |v| v.critical.len() > CRITICAL_ZERO_THRESHOLD,
        effect: |_| 0,
    },
];

pub const STRICT_POLICY_NAME: &str = "strict";

#[cfg(test)]
mod tests {
    use super::*;

    fn vulns(critical: usize, high: usize) -> Vulnerabilities {
        Vulnerabilities {
            critical: (0..critical).map(|i| format!("c{i}")).collect(),
            high: (0..high).map(|i| format!("h{i}")).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn rules_are_ordered_so_zero_rating_comes_last() {
        let ids: Vec<RuleId> = STRICT_POLICY.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![RuleId::CriticalCap, RuleId::HighCap, RuleId::CriticalZero]
        );
    }

    #[test]
    fn no_effect_ever_raises_the_rating() {
        for rule in STRICT_POLICY {
            for stars in 0..=5u8 {
                assert!((rule.effect)(stars) <= stars, "{} raised {stars}", rule.id);
            }
        }
    }

    #[test]
    fn predicates_use_literal_thresholds() {
        let [crit_cap, high_cap, crit_zero] = [STRICT_POLICY[0], STRICT_POLICY[1], STRICT_POLICY[2]];

        assert!(!(crit_cap.applies)(&vulns(0, 3)));
        assert!((crit_cap.applies)(&vulns(1, 0)));
        assert!((high_cap.applies)(&vulns(0, 1)));
        assert!(!(crit_zero.applies)(&vulns(2, 0)));
        assert!((crit_zero.applies)(&vulns(3, 0)));
    }

    #[test]
    fn rule_ids_serialize_to_catalog_names() {
        let serialized = serde_json::to_string(&RuleId::CriticalZero).unwrap();
        assert_eq!(serialized, "\"R-CRIT-02\"");
        assert_eq!(RuleId::HighCap.to_string(), "R-HIGH-01");
    }
}
