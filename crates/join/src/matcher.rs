//! Tiered matching of properties to filtered mortgage records.
//!
//! Each tier pairs a predicate (does the tier apply to this mortgage table?)
//! with key extractors for both sides. Tiers are evaluated in order until one
//! yields a non-empty candidate set; among candidates the latest recording
//! date wins, ties going to the earliest row in source order.

use std::collections::HashMap;

use crate::address::normalize_address;
use crate::columns::MortgageColumns;
use crate::config::MatchStrategy;
use crate::model::{MortgageRecord, PropertyRecord};

type KeyFn<T> = fn(&T) -> Option<String>;

#[derive(Clone, Copy)]
pub struct MatchTier {
    pub strategy: MatchStrategy,
    applies: fn(&MortgageColumns) -> bool,
    property_key: KeyFn<PropertyRecord>,
    mortgage_key: KeyFn<MortgageRecord>,
}

fn non_empty(key: String) -> Option<String> {
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

fn parcel_key(parcel_id: &str) -> Option<String> {
    non_empty(parcel_id.trim().to_uppercase())
}

impl MatchTier {
    pub fn for_strategy(strategy: MatchStrategy) -> Self {
        match strategy {
            MatchStrategy::ParcelId => Self {
                strategy,
                applies: |cols| cols.parcel_id.is_some(),
                property_key: |p| parcel_key(&p.parcel_id),
                mortgage_key: |m| parcel_key(&m.parcel_id),
            },
            MatchStrategy::Address => Self {
                strategy,
                applies: |cols| cols.address.is_some(),
                property_key: |p| non_empty(normalize_address(&p.address_raw)),
                mortgage_key: |m| non_empty(normalize_address(&m.address_raw)),
            },
        }
    }

    pub fn applies(&self, columns: &MortgageColumns) -> bool {
        (self.applies)(columns)
    }

    pub fn property_key(&self, property: &PropertyRecord) -> Option<String> {
        (self.property_key)(property)
    }

    pub fn mortgage_key(&self, mortgage: &MortgageRecord) -> Option<String> {
        (self.mortgage_key)(mortgage)
    }
}

/// Build the active tier list: configured order, minus tiers whose column the
/// mortgage table lacks.
pub fn active_tiers(strategies: &[MatchStrategy], columns: &MortgageColumns) -> Vec<MatchTier> {
    strategies
        .iter()
        .map(|s| MatchTier::for_strategy(*s))
        .filter(|tier| {
            let applies = tier.applies(columns);
            if !applies {
                log::info!("tier '{}' skipped: mortgages table has no such column", tier.strategy);
            }
            applies
        })
        .collect()
}

/// Latest recording date; first in iteration order on ties.
pub fn select_latest<'a, I>(candidates: I) -> Option<&'a MortgageRecord>
where
    I: IntoIterator<Item = &'a MortgageRecord>,
{
    candidates.into_iter().fold(None, |best, m| match best {
        Some(b) if b.recording_date >= m.recording_date => Some(b),
        _ => Some(m),
    })
}

struct TierIndex {
    tier: MatchTier,
    /// Key → mortgage indices, ascending (source order).
    by_key: HashMap<String, Vec<usize>>,
}

/// Mortgage lookup built once per run.
pub struct Matcher<'a> {
    mortgages: &'a [MortgageRecord],
    tiers: Vec<TierIndex>,
}

impl<'a> Matcher<'a> {
    pub fn new(mortgages: &'a [MortgageRecord], tiers: Vec<MatchTier>) -> Self {
        let tiers = tiers
            .into_iter()
            .map(|tier| {
                let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
                for (i, m) in mortgages.iter().enumerate() {
                    if let Some(key) = tier.mortgage_key(m) {
                        by_key.entry(key).or_default().push(i);
                    }
                }
                log::debug!("tier '{}': {} distinct keys", tier.strategy, by_key.len());
                TierIndex { tier, by_key }
            })
            .collect();
        Self { mortgages, tiers }
    }

    /// Best mortgage for `property` and the tier that found it.
    pub fn find(&self, property: &PropertyRecord) -> Option<(MatchStrategy, &'a MortgageRecord)> {
        let mortgages = self.mortgages;
        self.tiers.iter().find_map(|index| {
            let key = index.tier.property_key(property)?;
            let candidates = index.by_key.get(&key)?;
            select_latest(candidates.iter().map(|&i| &mortgages[i]))
                .map(|m| (index.tier.strategy, m))
        })
    }
}
