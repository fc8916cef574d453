//! Plain-text instance and solution formats.
//!
//! # Instance format
//!
//! ```text
//! <n>
//! <stress budget>
//! <i> <j> <happiness> <stress>
//! ...
//! ```
//!
//! One edge line per unordered pair `i < j` or `i > j`; every pair must appear
//! exactly once. The group count is not part of the file and is supplied by
//! the caller.
//!
//! # Solution format
//!
//! One `<student> <group>` line per student.

use crate::error::GroupingError;
use crate::model::{Instance, PairMatrix};
use std::collections::HashSet;
use std::io::{BufRead, Write};

fn parse_error(line: usize, message: impl Into<String>) -> GroupingError {
    GroupingError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_index(
    token: &str,
    line: usize,
    what: &str,
    bound: usize,
) -> Result<usize, GroupingError> {
    let value: usize = token
        .parse()
        .map_err(|_| parse_error(line, format!("{what} `{token}` is not an index")))?;
    if value >= bound {
        return Err(parse_error(
            line,
            format!("{what} {value} out of range (must be < {bound})"),
        ));
    }
    Ok(value)
}

fn parse_weight(token: &str, line: usize, what: &str) -> Result<f64, GroupingError> {
    let value: f64 = token
        .parse()
        .map_err(|_| parse_error(line, format!("{what} `{token}` is not a number")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(parse_error(
            line,
            format!("{what} must be finite and non-negative, got {value}"),
        ));
    }
    Ok(value)
}

/// Reads an instance in the edge-list format and pairs it with `k` groups.
///
/// Blank lines are ignored. Errors carry the 1-based line number.
///
/// # Examples
///
/// ```
/// use u_grouping::io::read_instance;
///
/// let text = "3\n9.5\n0 1 4 1\n0 2 0 2\n1 2 1 3\n";
/// let instance = read_instance(text.as_bytes(), 2).unwrap();
/// assert_eq!(instance.n(), 3);
/// assert!((instance.happiness(1, 0) - 4.0).abs() < 1e-12);
/// assert!((instance.stress_cap() - 4.75).abs() < 1e-12);
/// ```
pub fn read_instance<R: BufRead>(reader: R, k: usize) -> Result<Instance, GroupingError> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()));

    let (line_no, header) = lines
        .next()
        .ok_or_else(|| parse_error(1, "missing student count"))?;
    let header = header?;
    let n: usize = header.trim().parse().map_err(|_| {
        parse_error(
            line_no,
            format!("student count `{}` is not an integer", header.trim()),
        )
    })?;
    // Matrices are n * n; the header alone must not be able to overflow them.
    let Some(cells) = n.checked_mul(n) else {
        return Err(parse_error(line_no, format!("student count {n} is too large")));
    };
    let expected = (cells - n) / 2;

    let (line_no, budget) = lines
        .next()
        .ok_or_else(|| parse_error(line_no + 1, "missing stress budget"))?;
    let stress_budget = parse_weight(budget?.trim(), line_no, "stress budget")?;

    // Storage grows with the input, never with the header.
    let mut edges = Vec::new();
    let mut seen = HashSet::new();
    let mut last_line = line_no;

    for (line_no, line) in lines {
        last_line = line_no;
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [i, j, h, s] = tokens[..] else {
            return Err(parse_error(
                line_no,
                format!("expected 4 fields, found {}", tokens.len()),
            ));
        };
        let i = parse_index(i, line_no, "student", n)?;
        let j = parse_index(j, line_no, "student", n)?;
        if i == j {
            return Err(parse_error(line_no, format!("self-pair for student {i}")));
        }
        let (lo, hi) = (i.min(j), i.max(j));
        if !seen.insert((lo, hi)) {
            return Err(parse_error(line_no, format!("duplicate pair ({lo}, {hi})")));
        }
        let h = parse_weight(h, line_no, "happiness")?;
        let s = parse_weight(s, line_no, "stress")?;
        edges.push((lo, hi, h, s));
    }

    if edges.len() != expected {
        return Err(parse_error(
            last_line,
            format!(
                "instance lists {} pairs, a complete graph on {n} students has {expected}",
                edges.len()
            ),
        ));
    }

    let mut happiness = PairMatrix::zeros(n);
    let mut stress = PairMatrix::zeros(n);
    for (i, j, h, s) in edges {
        happiness.set(i, j, h);
        stress.set(i, j, s);
    }

    let instance = Instance::from_matrices(k, happiness, stress, stress_budget)?;
    tracing::debug!(students = n, groups = k, stress_budget, "instance loaded");
    Ok(instance)
}

/// Writes `instance` in the edge-list format, pairs in `i < j` order.
pub fn write_instance<W: Write>(mut writer: W, instance: &Instance) -> Result<(), GroupingError> {
    let n = instance.n();
    writeln!(writer, "{n}")?;
    writeln!(writer, "{}", instance.stress_budget())?;
    for i in 0..n {
        for j in i + 1..n {
            writeln!(
                writer,
                "{i} {j} {} {}",
                instance.happiness(i, j),
                instance.stress(i, j)
            )?;
        }
    }
    Ok(())
}

/// Writes one `student group` line per student.
pub fn write_solution<W: Write>(mut writer: W, group_of: &[usize]) -> Result<(), GroupingError> {
    for (student, group) in group_of.iter().enumerate() {
        writeln!(writer, "{student} {group}")?;
    }
    Ok(())
}

/// Reads a solution for `instance`.
///
/// Lines may appear in any order, but every student must be listed exactly
/// once and every group label must be below `instance.k()`.
pub fn read_assignment<R: BufRead>(
    reader: R,
    instance: &Instance,
) -> Result<Vec<usize>, GroupingError> {
    let n = instance.n();
    let k = instance.k();
    let mut group_of: Vec<Option<usize>> = vec![None; n];

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let [student, group] = tokens[..] else {
            return Err(parse_error(
                line_no,
                format!("expected 2 fields, found {}", tokens.len()),
            ));
        };
        let student = parse_index(student, line_no, "student", n)?;
        let group = parse_index(group, line_no, "group", k)?;
        if group_of[student].replace(group).is_some() {
            return Err(parse_error(
                line_no,
                format!("student {student} listed twice"),
            ));
        }
    }

    group_of
        .into_iter()
        .enumerate()
        .map(|(student, g)| {
            g.ok_or_else(|| {
                GroupingError::InvalidAssignment(format!("student {student} is not assigned"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "3\n9.5\n0 1 4 1\n0 2 0 2\n1 2 1 3\n";

    #[test]
    fn test_read_instance() {
        let inst = read_instance(TRIANGLE.as_bytes(), 2).unwrap();
        assert_eq!(inst.n(), 3);
        assert_eq!(inst.k(), 2);
        assert!((inst.stress_budget() - 9.5).abs() < 1e-12);
        assert!((inst.happiness(0, 1) - 4.0).abs() < 1e-12);
        assert!((inst.stress(2, 1) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_read_instance_reversed_pairs_and_blank_lines() {
        let text = "2\n\n1\n1 0 7.25 0.5\n\n";
        let inst = read_instance(text.as_bytes(), 1).unwrap();
        assert!((inst.happiness(0, 1) - 7.25).abs() < 1e-12);
        assert!((inst.stress(0, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_read_instance_reports_line() {
        let text = "3\n9.5\n0 1 4 1\n0 2 x 2\n1 2 1 3\n";
        match read_instance(text.as_bytes(), 2) {
            Err(GroupingError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_instance_rejects_bad_edges() {
        let duplicate = "3\n9.5\n0 1 4 1\n1 0 4 1\n1 2 1 3\n";
        assert!(matches!(
            read_instance(duplicate.as_bytes(), 2),
            Err(GroupingError::Parse { line: 4, .. })
        ));

        let self_pair = "2\n1\n1 1 0 0\n";
        assert!(read_instance(self_pair.as_bytes(), 1).is_err());

        let out_of_range = "2\n1\n0 2 0 0\n";
        assert!(read_instance(out_of_range.as_bytes(), 1).is_err());

        let negative = "2\n1\n0 1 -1 0\n";
        assert!(read_instance(negative.as_bytes(), 1).is_err());

        let short = "2\n1\n0 1 3\n";
        assert!(read_instance(short.as_bytes(), 1).is_err());
    }

    #[test]
    fn test_read_instance_requires_complete_graph() {
        let missing = "3\n9.5\n0 1 4 1\n0 2 0 2\n";
        assert!(matches!(
            read_instance(missing.as_bytes(), 2),
            Err(GroupingError::Parse { line: 4, .. })
        ));
    }

    #[test]
    fn test_read_instance_huge_header_is_parse_error() {
        // n * n overflows usize
        let overflow = "5000000000\n1\n0 1 1 1\n";
        assert!(matches!(
            read_instance(overflow.as_bytes(), 1),
            Err(GroupingError::Parse { line: 1, .. })
        ));

        let max = format!("{}\n1\n0 1 1 1\n", usize::MAX);
        assert!(matches!(
            read_instance(max.as_bytes(), 1),
            Err(GroupingError::Parse { line: 1, .. })
        ));

        // Fits in usize but lists far too few pairs; rejected before allocating.
        let sparse = "3000000000\n1\n0 1 1 1\n";
        assert!(matches!(
            read_instance(sparse.as_bytes(), 1),
            Err(GroupingError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_read_instance_invalid_group_count() {
        assert!(matches!(
            read_instance(TRIANGLE.as_bytes(), 4),
            Err(GroupingError::Instance(_))
        ));
    }

    #[test]
    fn test_write_then_read_instance() {
        let inst = read_instance(TRIANGLE.as_bytes(), 2).unwrap();
        let mut buf = Vec::new();
        write_instance(&mut buf, &inst).unwrap();
        let again = read_instance(buf.as_slice(), 2).unwrap();
        assert_eq!(inst, again);
    }

    #[test]
    fn test_solution_io() {
        let inst = read_instance(TRIANGLE.as_bytes(), 2).unwrap();
        let mut buf = Vec::new();
        write_solution(&mut buf, &[0, 0, 1]).unwrap();
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "0 0\n1 0\n2 1\n");
        assert_eq!(read_assignment(buf.as_slice(), &inst).unwrap(), vec![0, 0, 1]);

        // Any line order.
        let shuffled = "2 1\n0 0\n1 0\n";
        assert_eq!(read_assignment(shuffled.as_bytes(), &inst).unwrap(), vec![0, 0, 1]);
    }

    #[test]
    fn test_read_assignment_errors() {
        let inst = read_instance(TRIANGLE.as_bytes(), 2).unwrap();
        assert!(matches!(
            read_assignment("0 0\n1 1\n".as_bytes(), &inst),
            Err(GroupingError::InvalidAssignment(_))
        ));
        assert!(matches!(
            read_assignment("0 0\n0 1\n2 1\n".as_bytes(), &inst),
            Err(GroupingError::Parse { line: 2, .. })
        ));
        assert!(read_assignment("0 0\n1 2\n2 1\n".as_bytes(), &inst).is_err());
    }
}
