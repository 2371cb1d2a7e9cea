use std::{
    cmp::Ordering,
    fmt::{self, Display, Write},
    hash::{Hash, Hasher},
};

use sart_data_structures::{bit_field::BitField, histogram::Histogram};

use crate::{
    ace::{AceRule, AceRules},
    netlist::{LevelId, Netlist},
    node::Node,
    Error, Result,
};

/// An AVF value usable as a histogram bin. Ordered by `f64::total_cmp`, with
/// `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Copy)]
pub struct Avf(f64);

impl Avf {
    pub fn new(val: f64) -> Self {
        Self(if val == 0.0 { 0.0 } else { val })
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Avf {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Avf {}

impl Hash for Avf {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for Avf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Avf {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Display for Avf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Vulnerability of one sequential node.
#[derive(Debug, Clone, PartialEq)]
pub struct SeqAvf {
    /// `min(<read terms>, <write terms>)`.
    pub eqn: String,
    pub val: f64,
}

fn side(
    node: &Node,
    bits: &BitField,
    rules: &AceRules,
    avf: fn(&AceRule) -> f64,
) -> Result<(String, f64)> {
    let mut eqn = String::new();
    let mut val = 0.0;

    for pos in bits.iter_set() {
        let rule = rules.get(pos).ok_or_else(|| Error::RuleOutOfRange {
            pos,
            node: node.name.clone(),
            count: rules.len(),
        })?;
        if !eqn.is_empty() {
            eqn.push('+');
        }
        let _ = write!(eqn, "{:.4}", avf(rule));
        val += avf(rule);
    }

    // untouched by any rule, fully vulnerable
    if eqn.is_empty() {
        return Ok(("1.0000".to_string(), 1.0));
    }
    Ok((eqn, val))
}

pub fn seq_avf(node: &Node, rules: &AceRules) -> Result<SeqAvf> {
    let (reqn, rval) = side(node, &node.rp_ace, rules, |rule| rule.rpavf)?;
    let (weqn, wval) = side(node, &node.wp_ace, rules, |rule| rule.wpavf)?;

    Ok(SeqAvf {
        eqn: format!("min({reqn}, {weqn})"),
        val: rval.min(wval),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetStats {
    pub nodes: usize,
    pub ace: usize,
    pub seqn: usize,
    pub eqn_hist: Histogram<String>,
    pub val_hist: Histogram<Avf>,
}

impl NetStats {
    pub fn add_node(&mut self, node: &Node, rules: &AceRules) -> Result<()> {
        self.nodes += 1;
        if node.is_ace {
            self.ace += 1;
        }
        if node.is_seq() {
            self.seqn += 1;
            let SeqAvf { eqn, val } = seq_avf(node, rules)?;
            self.eqn_hist.add(eqn);
            self.val_hist.add(Avf::new(val));
        }
        Ok(())
    }

    pub fn plus(&mut self, addend: &NetStats) {
        self.nodes += addend.nodes;
        self.ace += addend.ace;
        self.seqn += addend.seqn;
        self.eqn_hist.merge(&addend.eqn_hist);
        self.val_hist.merge(&addend.val_hist);
    }
}

impl Display for NetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nodes:{} Ace:{} Seqn:{}", self.nodes, self.ace, self.seqn)?;
        if self.seqn != 0 {
            write!(f, "\n{}\n{}", self.eqn_hist, self.val_hist)?;
        }
        Ok(())
    }
}

/// Statistics of one level: `own` counts its nodes only, `total` includes
/// every subnet below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelStats {
    pub name: String,
    pub module: String,
    pub depth: usize,
    pub own: NetStats,
    pub total: NetStats,
    pub subnets: Vec<LevelStats>,
}

impl LevelStats {
    /// One line per level down to `max_depth` levels below this one, `0` for
    /// the whole tree.
    pub fn report(&self, max_depth: usize) -> String {
        let mut out = String::new();
        self.report_into(&mut out, 0, max_depth);
        out
    }

    fn report_into(&self, out: &mut String, rel_depth: usize, max_depth: usize) {
        if max_depth != 0 && rel_depth > max_depth {
            return;
        }

        let total = &self.total;
        let _ = writeln!(
            out,
            "{}{} ({}) Nodes:{} Ace:{} Seqn:{}",
            "|   ".repeat(rel_depth),
            self.name,
            self.module,
            total.nodes,
            total.ace,
            total.seqn
        );
        for subnet in &self.subnets {
            subnet.report_into(out, rel_depth + 1, max_depth);
        }
    }
}

impl Netlist {
    pub fn level_stats(&self, level_id: LevelId, rules: &AceRules) -> Result<LevelStats> {
        let level = &self[level_id];

        let mut own = NetStats::default();
        for (_, node) in level.nodes() {
            own.add_node(node, rules)?;
        }

        let mut total = own.clone();
        let subnets = level
            .subnets()
            .map(|(_, subnet_id)| {
                let stats = self.level_stats(subnet_id, rules)?;
                total.plus(&stats.total);
                Ok(stats)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LevelStats {
            name: level.name.clone(),
            module: level.module.clone(),
            depth: level.depth,
            own,
            total,
            subnets,
        })
    }

    pub fn stats_tree(&self, rules: &AceRules) -> Result<Option<LevelStats>> {
        self.top()
            .map(|top| self.level_stats(top, rules))
            .transpose()
    }

    /// Totals over the whole hierarchy.
    pub fn stats(&self, rules: &AceRules) -> Result<NetStats> {
        Ok(self
            .stats_tree(rules)?
            .map(|stats| stats.total)
            .unwrap_or_default())
    }
}
