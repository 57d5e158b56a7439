//! Finding/edge parsing for query-engine output, grounded on
//! `workers/results/main.py`. The query engine's textual output encodes a
//! proof path as `q<n>([edges]): yes`; only the *first* such finding is
//! used (the original's `re.search`, not `re.finditer` — a known
//! limitation, preserved as-is, see DESIGN.md).

use regex::Regex;
use std::sync::OnceLock;

use crate::types::Location;

const START: &str = r"startloc_(\d+)_(\d+)";
const END: &str = r"endloc_(\d+)_(\d+)";
const FNAME: &str = r"([^,]+)";

fn finding_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"q(\d+)\(\[(.*?)\]\): yes").unwrap())
}

fn edge_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let loc = format!("{START}_{END}_{FNAME}");
        let edge = format!(r"\({loc},{loc}\)");
        Regex::new(&edge).unwrap()
    })
}

/// Restore the placeholder-encoded characters the query engine substitutes
/// into filenames so they survive its Datalog-safe fact syntax.
pub fn restore(filename: &str) -> String {
    filename
        .replace("_slash_", "/")
        .replace("_dot_", ".")
        .replace("_dash_", "-")
        .replace("_lbracket_", "[")
        .replace("_rbracket_", "]")
        .replace("_lparen_", "(")
        .replace("_rparen_", ")")
}

/// Parse the single dataflow path from query-engine output, if a finding is
/// present. Returns the chain of locations the path visits: one per edge
/// source plus the final edge's destination.
pub fn parse_proper_path(content: &str) -> Vec<Location> {
    let mut locations = Vec::new();

    let Some(finding) = finding_regex().captures(content) else {
        return locations;
    };
    let edges_blob = finding.get(2).map(|m| m.as_str()).unwrap_or_default();

    let all_edges: Vec<_> = edge_regex().captures_iter(edges_blob).collect();
    let n = all_edges.len();

    for (i, edge) in all_edges.iter().enumerate() {
        let group = |idx: usize| edge.get(idx).map(|m| m.as_str()).unwrap_or_default();
        let parse_i64 = |idx: usize| group(idx).parse::<i64>().unwrap_or(0);

        locations.push(Location {
            filename: restore(group(5)),
            line_start: parse_i64(1),
            col_start: parse_i64(2),
            line_end: parse_i64(3),
            col_end: parse_i64(4),
        });

        if i == n - 1 {
            locations.push(Location {
                filename: restore(group(10)),
                line_start: parse_i64(6),
                col_start: parse_i64(7),
                line_end: parse_i64(8),
                col_end: parse_i64(9),
            });
        }
    }

    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_undoes_every_placeholder() {
        let encoded = "src_slash_app_dot_py_lbracket_0_rbracket__lparen_x_rparen__dash_handler";
        assert_eq!(restore(encoded), "src/app.py[0](x)-handler");
    }

    #[test]
    fn no_finding_returns_empty_path() {
        assert_eq!(parse_proper_path("q0([]): no"), Vec::<Location>::new());
    }

    #[test]
    fn single_edge_finding_yields_source_and_destination() {
        let content = "q1([(startloc_1_2_endloc_3_4_a_dot_py,startloc_5_6_endloc_7_8_b_dot_py)]): yes";
        let path = parse_proper_path(content);
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].filename, "a.py");
        assert_eq!(path[0].line_start, 1);
        assert_eq!(path[0].col_start, 2);
        assert_eq!(path[0].line_end, 3);
        assert_eq!(path[0].col_end, 4);
        assert_eq!(path[1].filename, "b.py");
        assert_eq!(path[1].line_start, 5);
    }

    #[test]
    fn only_the_first_finding_is_used() {
        let content = concat!(
            "q1([(startloc_1_1_endloc_1_1_a_dot_py,startloc_2_2_endloc_2_2_b_dot_py)]): yes ",
            "q2([(startloc_9_9_endloc_9_9_c_dot_py,startloc_8_8_endloc_8_8_d_dot_py)]): yes",
        );
        let path = parse_proper_path(content);
        assert_eq!(path[0].filename, "a.py");
    }
}
