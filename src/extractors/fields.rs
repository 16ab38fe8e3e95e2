// src/extractors/fields.rs

// --- Imports ---
use once_cell::sync::Lazy;
use roxmltree::Document;
use std::fmt;

// --- Constants ---
// Sentinel spellings used by the 990 e-file schemas for checkbox and
// indicator tags. Comparison is case-sensitive, matching the schemas.
const TRUTHY: &[&str] = &["true", "1", "X"];
const FALSY: &[&str] = &["false", "0"];

/// Code written for a tri-state indicator whose tag is absent (or present
/// with a value outside the recognized sentinels).
pub const NOT_REPORTED: i64 = 2;

/// Code written for `tax_status` when no exemption checkbox is set.
pub const TAX_STATUS_UNKNOWN: i64 = 4;

// --- Data Structures ---

/// How a resolved tag value (or its absence) becomes a record value.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Integer field, e.g. an identifier or a count.
    Int { default: i64 },
    /// Free-text field.
    Text { default: &'static str },
    /// Currency amount, written as raw decimal text. No scaling.
    Amount { default: f64 },
    /// Simple indicator: 1 when the tag holds a truthy sentinel, else the
    /// default. Used for `contract_term`.
    Flag { default: i64 },
    /// The position of the first candidate holding a truthy sentinel
    /// becomes the code; `unknown` when none does. The candidate list
    /// defines the code space, so its ordering must stay stable.
    Categorical { unknown: i64 },
    /// {0 = false, 1 = true, 2 = not reported}.
    TriState,
}

/// Declarative description of one logical field: where to look for it, in
/// what order, and what to write when it cannot be found. Different filing
/// schema revisions use different tag names for the same logical field, so
/// candidates are listed most-modern-first and the first non-empty match
/// wins.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Candidate tag paths, `/`-separated for nested lookup.
    pub candidates: &'static [&'static str],
    pub kind: FieldKind,
}

/// One extracted value. Display output is exactly what lands in the CSV.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Amount(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Amount(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
        }
    }
}

// --- Field Table ---
// The column set extracted from each filing, in output order. Candidate
// lists collect the tag names observed across schema revisions; the
// nested paths disambiguate tags that also occur in unrelated sections.
pub static FIELD_SPECS: Lazy<Vec<FieldSpec>> = Lazy::new(|| {
    use FieldKind::*;
    vec![
        FieldSpec { name: "ein", candidates: &["EIN"], kind: Int { default: 0 } },
        FieldSpec {
            name: "contract_term",
            candidates: &["ContractTerminationInd"],
            kind: Flag { default: 0 },
        },
        FieldSpec {
            name: "tax_status",
            candidates: &[
                "Organization501c3Ind",
                "Organization501cInd",
                "Organization4947a1Ind",
                "Organization527Ind",
            ],
            kind: Categorical { unknown: TAX_STATUS_UNKNOWN },
        },
        FieldSpec {
            name: "org_name",
            candidates: &["BusinessNameLine1Txt", "Filer/BusinessName/BusinessNameLine1"],
            kind: Text { default: "" },
        },
        FieldSpec {
            name: "city",
            candidates: &["Filer/USAddress/CityNm", "Filer/USAddress/City", "City"],
            kind: Text { default: "" },
        },
        FieldSpec {
            name: "state",
            candidates: &[
                "Filer/USAddress/StateAbbreviationCd",
                "Filer/USAddress/State",
                "State",
            ],
            kind: Text { default: "" },
        },
        FieldSpec { name: "tax_year", candidates: &["TaxYr"], kind: Int { default: 0 } },
        FieldSpec {
            name: "activity",
            candidates: &["ActivityOrMissionDesc"],
            kind: Text { default: "" },
        },
        FieldSpec { name: "year_formed", candidates: &["FormationYr"], kind: Int { default: 0 } },
        FieldSpec {
            name: "volunteer_ct",
            candidates: &["TotalVolunteersCnt"],
            kind: Int { default: 0 },
        },
        FieldSpec {
            name: "employee_ct",
            candidates: &["TotalEmployeeCnt"],
            kind: Int { default: 0 },
        },
        // Revenues (Form 990 Part VIII)
        FieldSpec {
            name: "rev_campaigns",
            candidates: &["FederatedCampaignsAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "rev_membership",
            candidates: &["MembershipDuesAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "rev_fundraising",
            candidates: &["FundraisingAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "rev_govgrants",
            candidates: &["GovernmentGrantsAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "rev_other",
            candidates: &["AllOtherContributionsAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "rev_progserv",
            candidates: &["TotalProgramServiceRevenueAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "rev_netfundraising",
            candidates: &["NetIncmFromFundraisingEvtGrp/TotalRevenueColumnAmt"],
            kind: Amount { default: 0.0 },
        },
        // Total revenue has gone through four tag names across revisions.
        FieldSpec {
            name: "total_revenue",
            candidates: &[
                "TotalRevenueCurrentYear",
                "TotalRevenue",
                "TotalRevenueAmt",
                "CYTotalRevenueAmt",
            ],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "total_revenue_py",
            candidates: &["PYTotalRevenueAmt"],
            kind: Amount { default: 0.0 },
        },
        // Expenses (Part IX)
        FieldSpec {
            name: "exp_grants",
            candidates: &["CYGrantsAndSimilarPaidAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "exp_progserv",
            candidates: &["CYBenefitsPaidToMembersAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "exp_management",
            candidates: &["CYSalariesCompEmpBnftPaidAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "exp_fundraising",
            candidates: &["CYTotalFundraisingExpenseAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "total_expenses",
            candidates: &["CYTotalExpensesAmt", "TotalExpenses", "TotalExpensesAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "total_expenses_py",
            candidates: &["PYTotalExpensesAmt"],
            kind: Amount { default: 0.0 },
        },
        // Compensation (Part VII)
        FieldSpec {
            name: "total_compensations",
            candidates: &["TotalReportableCompFromOrgAmt"],
            kind: Amount { default: 0.0 },
        },
        FieldSpec {
            name: "comp_more100k",
            candidates: &["IndivRcvdGreaterThan100KCnt"],
            kind: Int { default: 0 },
        },
        FieldSpec {
            name: "net_assets",
            candidates: &["NetAssetsOrFundBalancesEOYAmt"],
            kind: Amount { default: 0.0 },
        },
        // Part IV / Part V indicators
        FieldSpec {
            name: "pol_act",
            candidates: &["PoliticalCampaignActyInd"],
            kind: TriState,
        },
        FieldSpec { name: "lob_act", candidates: &["LobbyingActivitiesInd"], kind: TriState },
        FieldSpec {
            name: "foreign_office",
            candidates: &["ForeignOfficeInd"],
            kind: TriState,
        },
        FieldSpec {
            name: "foreign_fundraising",
            candidates: &["ForeignActivitiesInd"],
            kind: TriState,
        },
        FieldSpec {
            name: "foreign_assist",
            candidates: &["MoreThan5000KToOrgInd", "MoreThan5000KToIndividualsInd"],
            kind: TriState,
        },
    ]
});

// --- Resolver ---

/// Resolves one candidate path to its first non-empty text value.
///
/// Each `/` segment narrows the search to descendants of the previous
/// match. Comparison is on local tag names only: the 990 e-file documents
/// declare a default namespace, and matching expanded names would miss
/// every tag.
pub fn resolve_path(doc: &Document, path: &str) -> Option<String> {
    let mut node = doc.root();
    for segment in path.split('/') {
        node = node
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == segment)?;
    }
    let text = node.text()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Tries candidates in declared order and returns the earliest match.
fn resolve_first(doc: &Document, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|&path| resolve_path(doc, path))
}

fn is_truthy(value: &str) -> bool {
    TRUTHY.contains(&value)
}

/// Coerces an indicator value into {0, 1, 2}. Presence alone is not taken
/// as evidence of "true": a value outside the recognized sentinels counts
/// as not-reported.
fn tri_state(resolved: Option<String>) -> i64 {
    match resolved.as_deref() {
        None => NOT_REPORTED,
        Some(v) if is_truthy(v) => 1,
        Some(v) if FALSY.contains(&v) => 0,
        Some(_) => NOT_REPORTED,
    }
}

impl FieldSpec {
    /// Evaluates this field against a parsed filing. Never fails: a miss on
    /// every candidate resolves to the declared default.
    pub fn evaluate(&self, doc: &Document) -> FieldValue {
        match self.kind {
            FieldKind::Int { default } => {
                let parsed = resolve_first(doc, self.candidates)
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(default);
                FieldValue::Int(parsed)
            }
            FieldKind::Text { default } => {
                let value =
                    resolve_first(doc, self.candidates).unwrap_or_else(|| default.to_string());
                FieldValue::Text(value)
            }
            FieldKind::Amount { default } => {
                let parsed = resolve_first(doc, self.candidates)
                    .and_then(|v| v.parse::<f64>().ok())
                    .unwrap_or(default);
                FieldValue::Amount(parsed)
            }
            FieldKind::Flag { default } => {
                let set = resolve_first(doc, self.candidates)
                    .map(|v| is_truthy(&v))
                    .unwrap_or(false);
                FieldValue::Int(if set { 1 } else { default })
            }
            FieldKind::Categorical { unknown } => {
                let code = self
                    .candidates
                    .iter()
                    .position(|&path| {
                        resolve_path(doc, path).map(|v| is_truthy(&v)).unwrap_or(false)
                    })
                    .map(|idx| idx as i64)
                    .unwrap_or(unknown);
                FieldValue::Int(code)
            }
            FieldKind::TriState => FieldValue::Int(tri_state(resolve_first(doc, self.candidates))),
        }
    }
}
