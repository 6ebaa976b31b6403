//! Topological sort — Kahn's algorithm over tables and, independently,
//! over functions.
//!
//! Ties between nodes at the same readiness level are broken by queue
//! entry order (first become ready, first out), using each node's
//! position in the original input list to seed the initial queue, for
//! deterministic output across platforms.

use crate::diagnostics::DiagnosticLog;
use crate::ir::Database;
use std::collections::{HashMap, HashSet, VecDeque};

pub fn sort(db: &mut Database, log: &mut DiagnosticLog) {
    let table_names: Vec<String> = db.tables.iter().map(|t| t.name.clone()).collect();
    db.table_order = topo_order(&table_names, &db.dependencies, "table", log);

    let function_names: Vec<String> = db.functions.iter().map(|f| f.name.clone()).collect();
    db.function_order = topo_order(&function_names, &db.function_dependencies, "function", log);
}

/// Returns every node in dependency-respecting order. If a cycle prevents
/// some nodes from ever reaching in-degree zero, a warning is logged and
/// those nodes are appended at the tail in their original order.
fn topo_order(
    nodes: &[String],
    deps: &HashMap<String, Vec<String>>,
    kind: &str,
    log: &mut DiagnosticLog,
) -> Vec<String> {
    let empty: Vec<String> = Vec::new();

    let mut in_degree: HashMap<&str, usize> = nodes
        .iter()
        .map(|n| (n.as_str(), deps.get(n).map(|d| d.len()).unwrap_or(0)))
        .collect();

    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for n in nodes {
        for d in deps.get(n).unwrap_or(&empty) {
            dependents.entry(d.as_str()).or_default().push(n.as_str());
        }
    }

    let mut queue: VecDeque<&str> = VecDeque::new();
    for n in nodes {
        if in_degree.get(n.as_str()).copied().unwrap_or(0) == 0 {
            queue.push_back(n.as_str());
        }
    }

    let mut sorted: Vec<String> = Vec::with_capacity(nodes.len());
    let mut placed: HashSet<&str> = HashSet::new();

    while let Some(n) = queue.pop_front() {
        if !placed.insert(n) {
            continue;
        }
        sorted.push(n.to_string());

        if let Some(dependents_of_n) = dependents.get(n) {
            for &m in dependents_of_n {
                if let Some(e) = in_degree.get_mut(m) {
                    *e = e.saturating_sub(1);
                    if *e == 0 {
                        queue.push_back(m);
                    }
                }
            }
        }
    }

    if sorted.len() < nodes.len() {
        log.warning(format!(
            "cycle detected among {}s; {} node(s) could not be ordered and were appended in original order",
            kind,
            nodes.len() - sorted.len()
        ));
        for n in nodes {
            if !placed.contains(n.as_str()) {
                sorted.push(n.clone());
            }
        }
    }

    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn four_table_chain_orders_leaf_first() {
        let nodes = vec![
            "tenants".to_string(),
            "users".to_string(),
            "locations".to_string(),
            "areas".to_string(),
        ];
        let deps = deps(&[
            ("tenants", &[]),
            ("users", &["tenants"]),
            ("locations", &["tenants", "users"]),
            ("areas", &["tenants", "users", "locations"]),
        ]);
        let mut log = DiagnosticLog::new();
        let order = topo_order(&nodes, &deps, "table", &mut log);
        assert_eq!(order, vec!["tenants", "users", "locations", "areas"]);
        assert!(log.is_empty());
    }

    #[test]
    fn cycle_is_reported_and_unplaced_nodes_appended_in_order() {
        let nodes = vec!["a".to_string(), "b".to_string()];
        let deps = deps(&[("a", &["b"]), ("b", &["a"])]);
        let mut log = DiagnosticLog::new();
        let order = topo_order(&nodes, &deps, "table", &mut log);
        assert_eq!(order, vec!["a", "b"]);
        assert!(!log.is_empty());
    }

    #[test]
    fn ties_are_broken_by_original_position() {
        let nodes = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let deps = deps(&[("a", &[]), ("b", &[]), ("c", &[])]);
        let mut log = DiagnosticLog::new();
        let order = topo_order(&nodes, &deps, "table", &mut log);
        assert_eq!(order, vec!["b", "a", "c"]);
    }
}
