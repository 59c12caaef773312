//! Registry resolving which matching rules apply to a journal.

use std::collections::HashMap;

use crate::models::{normalize_key, Rule};

/// A publisher and the positions of its concrete rules in the registry's
/// input-ordered rule table. Pointer rules never join this list.
#[derive(Debug, Clone)]
pub struct Publisher {
    name: String,
    rules: Vec<usize>,
}

impl Publisher {
    /// The publisher's normalized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many concrete rules the publisher owns.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Registry for all loaded matching rules
///
/// Rules keep their input order. Lookups are by normalized journal key;
/// a `$publisher-standard` pointer expands in place to every concrete rule
/// owned by its publisher, across all of that publisher's journals.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    journals: HashMap<String, Vec<usize>>,
    journal_order: Vec<String>,
    publishers: HashMap<String, Publisher>,
}

impl RuleRegistry {
    /// Build a registry from rules in input order.
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut registry = Self {
            rules: Vec::new(),
            journals: HashMap::new(),
            journal_order: Vec::new(),
            publishers: HashMap::new(),
        };
        for rule in rules {
            registry.register(rule);
        }
        registry
    }

    /// Register a rule, indexing it by journal and, when concrete, by
    /// publisher.
    pub fn register(&mut self, rule: Rule) {
        let position = self.rules.len();
        let journal = rule.journal.clone();
        if !self.journals.contains_key(&journal) {
            self.journal_order.push(journal.clone());
        }
        self.journals.entry(journal).or_default().push(position);
        if !rule.is_publisher_standard() {
            self.publishers
                .entry(rule.publisher.clone())
                .or_insert_with(|| Publisher {
                    name: rule.publisher.clone(),
                    rules: Vec::new(),
                })
                .rules
                .push(position);
        }
        self.rules.push(rule);
    }

    /// Resolve the ordered rule set for a journal.
    ///
    /// Pointer rules are substituted by their publisher's concrete rules in
    /// the publisher's registration order; a pointer to an unknown publisher
    /// contributes nothing. An unknown journal resolves to an empty set
    /// rather than an error.
    pub fn rules_for(&self, journal: &str) -> Vec<&Rule> {
        let key = normalize_key(journal);
        let Some(positions) = self.journals.get(&key) else {
            return Vec::new();
        };
        let mut resolved = Vec::new();
        for &position in positions {
            let rule = &self.rules[position];
            if rule.is_publisher_standard() {
                if let Some(publisher) = self.publishers.get(&rule.publisher) {
                    resolved.extend(publisher.rules.iter().map(|&p| &self.rules[p]));
                }
            } else {
                resolved.push(rule);
            }
        }
        resolved
    }

    /// All journal keys in first-seen order.
    pub fn journals(&self) -> impl Iterator<Item = &str> {
        self.journal_order.iter().map(|s| s.as_str())
    }

    /// Look up a publisher by name.
    pub fn publisher(&self, name: &str) -> Option<&Publisher> {
        self.publishers.get(&normalize_key(name))
    }

    /// Check if any rule is registered for a journal.
    pub fn has_journal(&self, journal: &str) -> bool {
        self.journals.contains_key(&normalize_key(journal))
    }

    /// Total number of loaded rules, pointers included.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
