// ➗ Split Engine - turn a total into "who owes the payer how much"
//
// Three strategies:
//   Equal   - total / n for every member except the payer
//   Exact   - entered amounts, must not sum past the total
//   Percent - entered percentages, must not sum past 100
//
// A member whose input is 0 or absent never appears in the splits map.
// Validation happens before anything is built, so a rejected draft leaves no
// trace.

use crate::entities::Splits;
use crate::error::{LedgerError, LedgerResult};
use crate::money::{exceeds, validate_total};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Explicit per-member numeric inputs. Absent key = nothing entered.
pub type SplitInputs = BTreeMap<String, f64>;

// ============================================================================
// SPLIT MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    #[default]
    Equal,
    Exact,
    Percent,
}

impl SplitMode {
    pub const ALL: [SplitMode; 3] = [SplitMode::Equal, SplitMode::Exact, SplitMode::Percent];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMode::Equal => "equal",
            SplitMode::Exact => "exact",
            SplitMode::Percent => "percent",
        }
    }

    /// Next mode in tab order (equal -> exact -> percent -> equal)
    pub fn next(&self) -> Self {
        match self {
            SplitMode::Equal => SplitMode::Exact,
            SplitMode::Exact => SplitMode::Percent,
            SplitMode::Percent => SplitMode::Equal,
        }
    }

    /// Whether this mode reads per-member inputs
    pub fn takes_inputs(&self) -> bool {
        !matches!(self, SplitMode::Equal)
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equal" | "equally" => Ok(SplitMode::Equal),
            "exact" | "amount" => Ok(SplitMode::Exact),
            "percent" | "percentage" | "%" => Ok(SplitMode::Percent),
            other => Err(format!("Unknown split mode: {}", other)),
        }
    }
}

// ============================================================================
// EXPENSE DRAFT
// ============================================================================

/// Everything the caller supplies to create an expense
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub total: f64,
    pub paid_by: String,
    pub mode: SplitMode,
    pub inputs: SplitInputs,
}

impl ExpenseDraft {
    pub fn equal(total: f64, paid_by: impl Into<String>) -> Self {
        ExpenseDraft {
            total,
            paid_by: paid_by.into(),
            mode: SplitMode::Equal,
            inputs: SplitInputs::new(),
        }
    }

    pub fn exact(total: f64, paid_by: impl Into<String>, inputs: SplitInputs) -> Self {
        ExpenseDraft {
            total,
            paid_by: paid_by.into(),
            mode: SplitMode::Exact,
            inputs,
        }
    }

    pub fn percent(total: f64, paid_by: impl Into<String>, inputs: SplitInputs) -> Self {
        ExpenseDraft {
            total,
            paid_by: paid_by.into(),
            mode: SplitMode::Percent,
            inputs,
        }
    }

    /// Input entered for `member`, 0 when nothing was entered
    fn input_for(&self, member: &str) -> f64 {
        self.inputs.get(member).copied().unwrap_or(0.0)
    }
}

// ============================================================================
// INPUT BOUNDARY
// ============================================================================

/// Convert raw text fields into explicit inputs.
///
/// Blank text means "nothing entered" and produces no key. Numbers are kept
/// as-is, including an explicit 0 (the engine omits it later). Non-numeric
/// text and negative numbers are rejected.
pub fn parse_split_inputs<'a, I>(raw: I) -> LedgerResult<SplitInputs>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut inputs = SplitInputs::new();

    for (member, text) in raw {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let value: f64 = text.parse().map_err(|_| LedgerError::InvalidInput {
            member: member.to_string(),
            raw: text.to_string(),
        })?;
        check_input(member, value)?;

        inputs.insert(member.to_string(), value);
    }

    Ok(inputs)
}

fn check_input(member: &str, value: f64) -> LedgerResult<()> {
    if !value.is_finite() {
        return Err(LedgerError::InvalidInput {
            member: member.to_string(),
            raw: value.to_string(),
        });
    }
    if value < 0.0 {
        return Err(LedgerError::NegativeShare {
            member: member.to_string(),
            value,
        });
    }
    Ok(())
}

// ============================================================================
// SPLIT COMPUTATION
// ============================================================================

/// Compute the splits mapping for a draft against the group's member list.
///
/// Inputs keyed by the payer or by non-members are ignored.
pub fn compute_splits(members: &[String], draft: &ExpenseDraft) -> LedgerResult<Splits> {
    validate_total(draft.total)?;

    if !members.iter().any(|m| *m == draft.paid_by) {
        return Err(LedgerError::PayerNotMember(draft.paid_by.clone()));
    }

    let debtors: Vec<&String> = members.iter().filter(|m| **m != draft.paid_by).collect();

    if draft.mode.takes_inputs() {
        for member in &debtors {
            check_input(member, draft.input_for(member))?;
        }
    }

    let splits = match draft.mode {
        SplitMode::Equal => split_equal(members.len(), &debtors, draft.total),
        SplitMode::Exact => split_exact(&debtors, draft)?,
        SplitMode::Percent => split_percent(&debtors, draft)?,
    };

    debug!(
        mode = %draft.mode,
        payer = %draft.paid_by,
        total = draft.total,
        debtors = splits.len(),
        "Computed splits"
    );

    Ok(splits)
}

fn split_equal(member_count: usize, debtors: &[&String], total: f64) -> Splits {
    let share = total / member_count as f64;
    debtors
        .iter()
        .map(|member| ((*member).clone(), share))
        .collect()
}

fn split_exact(debtors: &[&String], draft: &ExpenseDraft) -> LedgerResult<Splits> {
    let mut splits = Splits::new();
    let mut entered = 0.0;

    for member in debtors {
        let value = draft.input_for(member);
        entered += value;
        if value > 0.0 {
            splits.insert((*member).clone(), value);
        }
    }

    // payer share = total - entered must not go negative
    if exceeds(entered, draft.total) {
        return Err(LedgerError::ExactSplitExceedsTotal {
            total: draft.total,
            entered,
        });
    }

    Ok(splits)
}

fn split_percent(debtors: &[&String], draft: &ExpenseDraft) -> LedgerResult<Splits> {
    let mut splits = Splits::new();
    let mut used = 0.0;

    for member in debtors {
        let percent = draft.input_for(member);
        used += percent;
        if percent > 0.0 {
            splits.insert((*member).clone(), draft.total * percent / 100.0);
        }
    }

    if exceeds(used, 100.0) {
        return Err(LedgerError::PercentExceeds100 { used });
    }

    Ok(splits)
}

// ============================================================================
// LIVE PREVIEW
// ============================================================================

/// One row of the split preview, in member order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    pub member: String,
    pub is_payer: bool,
    /// Amount this member would owe (payer row: the payer's implicit share)
    pub amount: f64,
    /// Percent entered (percent mode only)
    pub percent: Option<f64>,
}

/// What the split would look like with the inputs entered so far.
///
/// Never fails: blank or invalid totals preview as 0, negative inputs count
/// as 0. Use `compute_splits` for the authoritative result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitPreview {
    pub mode: SplitMode,
    pub total: f64,
    pub rows: Vec<PreviewRow>,
    /// Payer's implicit share, floored at 0
    pub payer_share: f64,
    /// Percent left for the payer (percent mode only), floored at 0
    pub payer_percent: Option<f64>,
}

pub fn preview(members: &[String], draft: &ExpenseDraft) -> SplitPreview {
    let total = if draft.total.is_finite() && draft.total > 0.0 {
        draft.total
    } else {
        0.0
    };
    let input = |member: &str| {
        let v = draft.input_for(member);
        if v.is_finite() && v > 0.0 {
            v
        } else {
            0.0
        }
    };
    let is_payer = |member: &str| member == draft.paid_by;

    match draft.mode {
        SplitMode::Equal => {
            let share = if members.is_empty() {
                0.0
            } else {
                total / members.len() as f64
            };
            SplitPreview {
                mode: draft.mode,
                total,
                rows: members
                    .iter()
                    .map(|m| PreviewRow {
                        member: m.clone(),
                        is_payer: is_payer(m),
                        amount: share,
                        percent: None,
                    })
                    .collect(),
                payer_share: share,
                payer_percent: None,
            }
        }
        SplitMode::Exact => {
            let entered: f64 = members.iter().filter(|m| !is_payer(m)).map(|m| input(m)).sum();
            let payer_share = (total - entered).max(0.0);
            SplitPreview {
                mode: draft.mode,
                total,
                rows: members
                    .iter()
                    .map(|m| PreviewRow {
                        member: m.clone(),
                        is_payer: is_payer(m),
                        amount: if is_payer(m) { payer_share } else { input(m) },
                        percent: None,
                    })
                    .collect(),
                payer_share,
                payer_percent: None,
            }
        }
        SplitMode::Percent => {
            let used: f64 = members.iter().filter(|m| !is_payer(m)).map(|m| input(m)).sum();
            let payer_percent = (100.0 - used).max(0.0);
            let payer_share = total * payer_percent / 100.0;
            SplitPreview {
                mode: draft.mode,
                total,
                rows: members
                    .iter()
                    .map(|m| {
                        if is_payer(m) {
                            PreviewRow {
                                member: m.clone(),
                                is_payer: true,
                                amount: payer_share,
                                percent: Some(payer_percent),
                            }
                        } else {
                            let p = input(m);
                            PreviewRow {
                                member: m.clone(),
                                is_payer: false,
                                amount: total * p / 100.0,
                                percent: Some(p),
                            }
                        }
                    })
                    .collect(),
                payer_share,
                payer_percent: Some(payer_percent),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::approx_eq;
    use proptest::prelude::*;

    fn members(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn inputs(pairs: &[(&str, f64)]) -> SplitInputs {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_equal_split_excludes_payer() {
        let group = members(&["User", "Alice", "Bob"]);
        let splits = compute_splits(&group, &ExpenseDraft::equal(300.0, "User")).unwrap();

        assert_eq!(splits, inputs(&[("Alice", 100.0), ("Bob", 100.0)]));
        assert!(!splits.contains_key("User"));
    }

    #[test]
    fn test_equal_split_single_member_owes_nothing() {
        let group = members(&["User"]);
        let splits = compute_splits(&group, &ExpenseDraft::equal(50.0, "User")).unwrap();
        assert!(splits.is_empty());
    }

    #[test]
    fn test_exact_split_scenario() {
        // Bob pays 90; User 30, Alice 20, Bob keeps 40
        let group = members(&["User", "Alice", "Bob"]);
        let draft = ExpenseDraft::exact(90.0, "Bob", inputs(&[("User", 30.0), ("Alice", 20.0)]));
        let splits = compute_splits(&group, &draft).unwrap();

        assert_eq!(splits, inputs(&[("User", 30.0), ("Alice", 20.0)]));
        let payer_share = draft.total - splits.values().sum::<f64>();
        assert_eq!(payer_share, 40.0);
    }

    #[test]
    fn test_exact_split_omits_zero_and_blank() {
        let group = members(&["User", "Alice", "Bob"]);
        let draft = ExpenseDraft::exact(90.0, "User", inputs(&[("Alice", 0.0)]));
        let splits = compute_splits(&group, &draft).unwrap();

        assert!(splits.is_empty());
        assert!(!splits.contains_key("Alice"));
        assert!(!splits.contains_key("Bob"));
    }

    #[test]
    fn test_exact_split_rejects_overcommit() {
        let group = members(&["User", "Alice", "Bob"]);
        let draft = ExpenseDraft::exact(50.0, "User", inputs(&[("Alice", 30.0), ("Bob", 30.0)]));

        let err = compute_splits(&group, &draft).unwrap_err();
        assert_eq!(
            err,
            LedgerError::ExactSplitExceedsTotal {
                total: 50.0,
                entered: 60.0
            }
        );
    }

    #[test]
    fn test_exact_split_allows_entries_summing_to_total() {
        let group = members(&["User", "Alice", "Bob"]);
        let draft = ExpenseDraft::exact(0.3, "User", inputs(&[("Alice", 0.1), ("Bob", 0.2)]));
        // 0.1 + 0.2 != 0.3 in f64, but matches in cents
        let splits = compute_splits(&group, &draft).unwrap();
        assert_eq!(splits.len(), 2);
    }

    #[test]
    fn test_exact_split_rejects_sub_cent_overcommit() {
        let group = members(&["User", "Alice", "Bob"]);
        let draft = ExpenseDraft::exact(10.0, "User", inputs(&[("Alice", 5.004), ("Bob", 5.0)]));

        let err = compute_splits(&group, &draft).unwrap_err();
        assert!(matches!(err, LedgerError::ExactSplitExceedsTotal { .. }));
    }

    #[test]
    fn test_exact_split_ignores_payer_and_strangers() {
        let group = members(&["User", "Alice"]);
        let draft = ExpenseDraft::exact(
            10.0,
            "User",
            inputs(&[("User", 500.0), ("Mallory", 500.0), ("Alice", 4.0)]),
        );
        let splits = compute_splits(&group, &draft).unwrap();
        assert_eq!(splits, inputs(&[("Alice", 4.0)]));
    }

    #[test]
    fn test_percent_split_amounts() {
        let group = members(&["User", "Alice", "Bob"]);
        let draft = ExpenseDraft::percent(200.0, "User", inputs(&[("Alice", 25.0), ("Bob", 50.0)]));
        let splits = compute_splits(&group, &draft).unwrap();

        assert_eq!(splits, inputs(&[("Alice", 50.0), ("Bob", 100.0)]));
    }

    #[test]
    fn test_percent_split_rejects_over_100() {
        let group = members(&["User", "Alice", "Bob"]);
        let draft = ExpenseDraft::percent(100.0, "User", inputs(&[("Alice", 60.0), ("Bob", 50.0)]));

        let err = compute_splits(&group, &draft).unwrap_err();
        assert_eq!(err, LedgerError::PercentExceeds100 { used: 110.0 });
    }

    #[test]
    fn test_percent_split_rejects_sub_cent_overshoot() {
        let group = members(&["User", "Alice", "Bob"]);
        let draft = ExpenseDraft::percent(10.0, "User", inputs(&[("Alice", 50.004), ("Bob", 50.0)]));

        let err = compute_splits(&group, &draft).unwrap_err();
        assert!(matches!(err, LedgerError::PercentExceeds100 { .. }));
    }

    #[test]
    fn test_percent_split_omits_zero() {
        let group = members(&["User", "Alice", "Bob"]);
        let draft = ExpenseDraft::percent(100.0, "User", inputs(&[("Alice", 0.0), ("Bob", 100.0)]));
        let splits = compute_splits(&group, &draft).unwrap();
        assert_eq!(splits, inputs(&[("Bob", 100.0)]));
    }

    #[test]
    fn test_rejects_invalid_total() {
        let group = members(&["User", "Alice"]);
        for total in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let err = compute_splits(&group, &ExpenseDraft::equal(total, "User")).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount(_)), "total {}", total);
        }
    }

    #[test]
    fn test_rejects_unknown_payer() {
        let group = members(&["User", "Alice"]);
        let err = compute_splits(&group, &ExpenseDraft::equal(10.0, "Zed")).unwrap_err();
        assert_eq!(err, LedgerError::PayerNotMember("Zed".to_string()));
    }

    #[test]
    fn test_rejects_negative_input() {
        let group = members(&["User", "Alice", "Bob"]);
        let draft = ExpenseDraft::exact(10.0, "User", inputs(&[("Alice", -5.0), ("Bob", 8.0)]));
        let err = compute_splits(&group, &draft).unwrap_err();
        assert_eq!(
            err,
            LedgerError::NegativeShare {
                member: "Alice".to_string(),
                value: -5.0
            }
        );
    }

    #[test]
    fn test_parse_split_inputs_distinguishes_blank_and_zero() {
        let parsed = parse_split_inputs(vec![("Alice", "0"), ("Bob", "  "), ("Carol", "12.5")]).unwrap();

        assert_eq!(parsed.get("Alice"), Some(&0.0));
        assert_eq!(parsed.get("Bob"), None);
        assert_eq!(parsed.get("Carol"), Some(&12.5));
    }

    #[test]
    fn test_parse_split_inputs_rejects_garbage() {
        let err = parse_split_inputs(vec![("Alice", "ten")]).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidInput {
                member: "Alice".to_string(),
                raw: "ten".to_string()
            }
        );

        let err = parse_split_inputs(vec![("Alice", "-1")]).unwrap_err();
        assert!(matches!(err, LedgerError::NegativeShare { .. }));
    }

    #[test]
    fn test_split_mode_parse() {
        assert_eq!("Equal".parse::<SplitMode>().unwrap(), SplitMode::Equal);
        assert_eq!("exact".parse::<SplitMode>().unwrap(), SplitMode::Exact);
        assert_eq!("%".parse::<SplitMode>().unwrap(), SplitMode::Percent);
        assert!("thirds".parse::<SplitMode>().is_err());
        assert_eq!(SplitMode::Percent.next(), SplitMode::Equal);
    }

    #[test]
    fn test_preview_equal() {
        let group = members(&["User", "Alice", "Bob"]);
        let p = preview(&group, &ExpenseDraft::equal(90.0, "User"));

        assert_eq!(p.rows.len(), 3);
        assert!(p.rows.iter().all(|r| r.amount == 30.0));
        assert!(p.rows[0].is_payer);
        assert_eq!(p.payer_share, 30.0);
    }

    #[test]
    fn test_preview_exact_remaining_floors_at_zero() {
        let group = members(&["User", "Alice", "Bob"]);

        let p = preview(&group, &ExpenseDraft::exact(100.0, "User", inputs(&[("Alice", 30.0)])));
        assert_eq!(p.payer_share, 70.0);
        assert_eq!(p.rows[0].amount, 70.0);
        assert_eq!(p.rows[1].amount, 30.0);
        assert_eq!(p.rows[2].amount, 0.0);

        let p = preview(&group, &ExpenseDraft::exact(100.0, "User", inputs(&[("Alice", 130.0)])));
        assert_eq!(p.payer_share, 0.0);
    }

    #[test]
    fn test_preview_percent_remaining() {
        let group = members(&["User", "Alice", "Bob"]);
        let p = preview(
            &group,
            &ExpenseDraft::percent(200.0, "Alice", inputs(&[("User", 10.0), ("Bob", 40.0)])),
        );

        assert_eq!(p.payer_percent, Some(50.0));
        assert_eq!(p.payer_share, 100.0);
        assert_eq!(p.rows[0].amount, 20.0);
        assert_eq!(p.rows[2].amount, 80.0);
        assert_eq!(p.rows[1].percent, Some(50.0));
    }

    #[test]
    fn test_preview_tolerates_blank_total() {
        let group = members(&["User", "Alice"]);
        let p = preview(&group, &ExpenseDraft::equal(f64::NAN, "User"));
        assert_eq!(p.total, 0.0);
        assert_eq!(p.payer_share, 0.0);
    }

    proptest! {
        #[test]
        fn equal_split_conserves_total(
            total in 0.01f64..1_000_000.0,
            member_count in 2usize..=12,
            payer_idx in 0usize..12,
        ) {
            let group: Vec<String> = (0..member_count).map(|i| format!("M{}", i)).collect();
            let payer = group[payer_idx % member_count].clone();
            let splits = compute_splits(&group, &ExpenseDraft::equal(total, payer.clone())).unwrap();

            let owed: f64 = splits.values().sum();
            let expected = total * (member_count as f64 - 1.0) / member_count as f64;
            prop_assert!((owed - expected).abs() < 1e-6 * total.max(1.0));
            prop_assert!(!splits.contains_key(&payer));
            prop_assert_eq!(splits.len(), member_count - 1);
        }

        #[test]
        fn exact_split_succeeds_iff_within_total(
            total in 1u32..10_000,
            a in 0u32..6_000,
            b in 0u32..6_000,
        ) {
            let group = members(&["User", "Alice", "Bob"]);
            let draft = ExpenseDraft::exact(
                total as f64,
                "User",
                inputs(&[("Alice", a as f64), ("Bob", b as f64)]),
            );
            let result = compute_splits(&group, &draft);

            if a + b <= total {
                let splits = result.unwrap();
                prop_assert_eq!(splits.contains_key("Alice"), a > 0);
                prop_assert_eq!(splits.contains_key("Bob"), b > 0);
                if a > 0 {
                    prop_assert_eq!(splits["Alice"], a as f64);
                }
            } else {
                let is_exceeds = matches!(result, Err(LedgerError::ExactSplitExceedsTotal { .. }));
                prop_assert!(is_exceeds);
            }
        }

        #[test]
        fn percent_split_succeeds_iff_within_100(
            total in 1u32..10_000,
            a in 0u32..=100,
            b in 0u32..=100,
        ) {
            let group = members(&["User", "Alice", "Bob"]);
            let draft = ExpenseDraft::percent(
                total as f64,
                "Bob",
                inputs(&[("User", a as f64), ("Alice", b as f64)]),
            );
            let result = compute_splits(&group, &draft);

            if a + b <= 100 {
                let splits = result.unwrap();
                prop_assert_eq!(splits.contains_key("User"), a > 0);
                if a > 0 {
                    prop_assert!(approx_eq(splits["User"], total as f64 * a as f64 / 100.0));
                }
                prop_assert!(!splits.contains_key("Bob"));
            } else {
                let is_exceeds = matches!(result, Err(LedgerError::PercentExceeds100 { .. }));
                prop_assert!(is_exceeds);
            }
        }
    }
}
