//! ACE rules and the reset + mark pass that turns them into marker sources.
//!
//! The position of a rule in its list is the bit it owns in every node's
//! marker fields, so the same list must be used to mark, walk and report.

use std::{
    fmt::{self, Display},
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use regex::Regex;
use sart_data_structures::bit_field::BitField;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{netlist::Netlist, node::Node, Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AceRule {
    #[serde(rename = "sel", default)]
    pub selector: Selector,
    pub rpavf: f64,
    pub wpavf: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl AceRule {
    pub fn new(selector: Selector, rpavf: f64, wpavf: f64) -> Self {
        Self {
            selector,
            rpavf,
            wpavf,
            comment: String::new(),
        }
    }
}

impl Selector {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn module(mut self, pattern: impl Into<String>) -> Self {
        self.module = Some(pattern.into());
        self
    }

    pub fn name(mut self, pattern: impl Into<String>) -> Self {
        self.name = Some(pattern.into());
        self
    }
}

impl Display for AceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pattern = |p: &Option<String>| p.clone().unwrap_or_else(|| "*".into());
        write!(
            f,
            "{{module:{} name:{} rp:{:.4} wp:{:.4}}}",
            pattern(&self.selector.module),
            pattern(&self.selector.name),
            self.rpavf,
            self.wpavf
        )
    }
}

/// Ordered rule list. Serialised as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AceRules(Vec<AceRule>);

impl AceRules {
    pub fn new(rules: Vec<AceRule>) -> Self {
        Self(rules)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, pos: usize) -> Option<&AceRule> {
        self.0.get(pos)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &AceRule> + '_ {
        self.0.iter()
    }
}

impl FromIterator<AceRule> for AceRules {
    fn from_iter<I: IntoIterator<Item = AceRule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Every node of a design together with the name of the level owning it.
pub trait NodePopulation {
    fn try_for_each_node(
        &mut self,
        f: &mut dyn FnMut(&str, &mut Node) -> Result<()>,
    ) -> Result<()>;
}

impl NodePopulation for Netlist {
    fn try_for_each_node(
        &mut self,
        f: &mut dyn FnMut(&str, &mut Node) -> Result<()>,
    ) -> Result<()> {
        for level in self.levels.values_mut() {
            for node in level.nodes.values_mut() {
                f(&level.name, node)?;
            }
        }
        Ok(())
    }
}

struct CompiledSelector {
    module: Option<Regex>,
    name: Option<Regex>,
}

impl CompiledSelector {
    fn new(idx: usize, selector: &Selector) -> Result<Self> {
        let compile = |pattern: &Option<String>| -> Result<Option<Regex>> {
            match pattern.as_deref() {
                None | Some("") => Ok(None),
                Some(pattern) => Regex::new(pattern)
                    .map(Some)
                    .map_err(|source| Error::InvalidSelector { idx, source }),
            }
        };

        Ok(Self {
            module: compile(&selector.module)?,
            name: compile(&selector.name)?,
        })
    }

    fn matches(&self, level: &str, name: &str) -> bool {
        self.module.as_ref().map_or(true, |re| re.is_match(level))
            && self.name.as_ref().map_or(true, |re| re.is_match(name))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkCounts {
    pub reset: usize,
    pub marked: usize,
}

/// Resets previously walked nodes and seeds one bit per rule into every node
/// its selector picks.
pub struct AceMarker<'r> {
    rules: &'r AceRules,
    selectors: Vec<CompiledSelector>,
}

impl<'r> AceMarker<'r> {
    /// Compiles every selector up front so that a bad pattern fails before any
    /// node is touched.
    pub fn new(rules: &'r AceRules) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::NoRules);
        }

        let selectors = rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| CompiledSelector::new(idx, &rule.selector))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules, selectors })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.rules.len()
    }

    /// Clears the markers of every node that carries any, or whose fields do
    /// not fit the current rule count.
    pub fn reset(&self, population: &mut dyn NodePopulation) -> Result<usize> {
        let width = self.width();
        let byte_len = BitField::byte_len(width);
        let mut reset = 0;

        population.try_for_each_node(&mut |_, node| {
            let stale = node.is_ace
                || !node.rp_ace.all_unset()
                || !node.wp_ace.all_unset()
                || node.rp_ace.len() != byte_len
                || node.wp_ace.len() != byte_len;

            if stale {
                node.reset(width)?;
                reset += 1;
            }
            Ok(())
        })?;

        info!("Reset {reset} nodes");
        Ok(reset)
    }

    pub fn mark(&self, population: &mut dyn NodePopulation) -> Result<usize> {
        let mut per_rule = vec![0; self.selectors.len()];

        population.try_for_each_node(&mut |level, node| {
            for (pos, selector) in self.selectors.iter().enumerate() {
                if selector.matches(level, &node.name) {
                    node.mark(pos)?;
                    per_rule[pos] += 1;
                }
            }
            Ok(())
        })?;

        let total = self.width();
        for (idx, (rule, count)) in self.rules.iter().zip(&per_rule).enumerate() {
            info!("({}/{total}) Marked {count} nodes ACE with {rule}", idx + 1);
        }

        Ok(per_rule.into_iter().sum())
    }

    pub fn run(&self, population: &mut dyn NodePopulation) -> Result<MarkCounts> {
        let reset = self.reset(population)?;
        let marked = self.mark(population)?;

        Ok(MarkCounts { reset, marked })
    }
}
