use anyhow::Result;
use std::collections::HashMap;

/// A named range on one sheet, already reduced to A1 notation.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    pub name: String,
    pub a1: String,
}

/// Logical fields the dashboard template defines as named ranges.
///
/// The template sheet is cloned per account, so the platform prefixes
/// every cloned range name; ranges are matched on their fixed suffix
/// instead of their full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetField {
    ImpressionsThreshold,
    ClicksThreshold,
    ConversionsThreshold,
    CostThreshold,
    LookbackWeeks,
    NotifyEmail,
    ImpressionsAlert,
    ClicksAlert,
    ConversionsAlert,
    CostAlert,
    RunDate,
    AccountId,
    AccountName,
    RunTimestamp,
    DataTable,
}

impl SheetField {
    pub const ALL: [SheetField; 15] = [
        SheetField::ImpressionsThreshold,
        SheetField::ClicksThreshold,
        SheetField::ConversionsThreshold,
        SheetField::CostThreshold,
        SheetField::LookbackWeeks,
        SheetField::NotifyEmail,
        SheetField::ImpressionsAlert,
        SheetField::ClicksAlert,
        SheetField::ConversionsAlert,
        SheetField::CostAlert,
        SheetField::RunDate,
        SheetField::AccountId,
        SheetField::AccountName,
        SheetField::RunTimestamp,
        SheetField::DataTable,
    ];

    /// Range-name suffix this field is bound to in the template.
    pub fn suffix(self) -> &'static str {
        match self {
            SheetField::ImpressionsThreshold => "impressions",
            SheetField::ClicksThreshold => "clicks",
            SheetField::ConversionsThreshold => "conversions",
            SheetField::CostThreshold => "cost",
            SheetField::LookbackWeeks => "weeks",
            SheetField::NotifyEmail => "email",
            SheetField::ImpressionsAlert => "impressions_alert",
            SheetField::ClicksAlert => "clicks_alert",
            SheetField::ConversionsAlert => "conversions_alert",
            SheetField::CostAlert => "cost_alert",
            SheetField::RunDate => "date",
            SheetField::AccountId => "account_id",
            SheetField::AccountName => "account_name",
            SheetField::RunTimestamp => "timestamp",
            SheetField::DataTable => "data",
        }
    }

    fn matches(self, range_name: &str) -> bool {
        let suffix = self.suffix();
        range_name == suffix || range_name.ends_with(&format!("_{suffix}"))
    }
}

/// Complete mapping from logical fields to A1 coordinates for one
/// account sheet, resolved once and validated up front.
#[derive(Debug, Clone)]
pub struct RangeMap {
    map: HashMap<SheetField, String>,
}

impl RangeMap {
    /// Resolve every logical field against the sheet's named ranges.
    /// Fails listing every missing field rather than blowing up later
    /// on a lookup miss.
    pub fn resolve(ranges: &[NamedRange]) -> Result<Self> {
        let mut map = HashMap::new();
        let mut missing = Vec::new();

        for field in SheetField::ALL {
            match ranges.iter().find(|range| field.matches(&range.name)) {
                Some(range) => {
                    map.insert(field, range.a1.clone());
                }
                None => missing.push(field.suffix()),
            }
        }

        if !missing.is_empty() {
            anyhow::bail!(
                "Sheet is missing named ranges for: {}. Re-copy the dashboard template sheet.",
                missing.join(", ")
            );
        }

        Ok(Self { map })
    }

    pub fn a1(&self, field: SheetField) -> &str {
        // Complete by construction.
        &self.map[&field]
    }
}
