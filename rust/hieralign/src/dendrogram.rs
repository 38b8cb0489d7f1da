//! Plain-text export of the merge tree for external dendrogram viewers.
//!
//! Two tab separated tables are written:
//!
//! - the leaf table, one line per row in global row order:
//!   `name  sample  mz  rt`
//! - the linkage table, one line per merge, children in the signed encoding
//!   of [`NodeRef::to_signed`]: `node  left  right  distance`. It starts
//!   with a `# leaves: N` line so trees with fewer than two leaves survive
//!   a round trip.
//!
//! [`read_linkage`] parses the linkage table back into the same tree.

use std::fs::File;
use std::io::{
    BufRead,
    BufWriter,
    Write,
};
use std::path::{
    Path,
    PathBuf,
};

use crate::clustering::{
    MergeNode,
    MergeTree,
    NodeRef,
};
use crate::errors::{
    AlignmentError,
    Result,
};
use crate::models::FeatureList;

const LEAF_HEADER: &str = "name\tsample\tmz\trt";
const LINKAGE_HEADER: &str = "node\tleft\tright\tdistance";
const LEAVES_PREFIX: &str = "# leaves:";

/// Fails with [`std::io::ErrorKind::InvalidData`] for sample names holding a
/// tab or a line break, they would corrupt the table.
pub fn write_leaf_table(writer: &mut impl Write, lists: &[FeatureList]) -> std::io::Result<()> {
    if let Some(list) = lists
        .iter()
        .find(|l| l.sample.name.contains(&['\t', '\n', '\r'][..]))
    {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Sample name {:?} contains a tab or line break",
                list.sample.name
            ),
        ));
    }
    writeln!(writer, "{}", LEAF_HEADER)?;
    for list in lists {
        for row in list.rows.iter() {
            writeln!(
                writer,
                "{}#{}\t{}\t{}\t{}",
                list.sample.name, row.id, list.sample.name, row.mz, row.rt
            )?;
        }
    }
    Ok(())
}

pub fn write_linkage(writer: &mut impl Write, tree: &MergeTree) -> std::io::Result<()> {
    writeln!(writer, "{} {}", LEAVES_PREFIX, tree.leaf_count())?;
    writeln!(writer, "{}", LINKAGE_HEADER)?;
    for (k, node) in tree.nodes().iter().enumerate() {
        // `{}` on f64 prints the shortest text that parses back to the same value.
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            k,
            node.left.to_signed(),
            node.right.to_signed(),
            node.distance
        )?;
    }
    Ok(())
}

fn parse_line_fields<'a>(line: &'a str, lineno: usize) -> Result<[&'a str; 4]> {
    let fields: Vec<&str> = line.split('\t').collect();
    fields.try_into().map_err(|x: Vec<&str>| {
        AlignmentError::parse(format!(
            "Line {}: expected 4 tab separated fields, got {}",
            lineno,
            x.len()
        ))
    })
}

pub fn read_linkage(reader: impl BufRead) -> Result<MergeTree> {
    let mut lines = reader.lines().enumerate();

    let leaf_count: usize = match lines.next() {
        Some((_, line)) => {
            let line = line?;
            line.strip_prefix(LEAVES_PREFIX)
                .ok_or_else(|| {
                    AlignmentError::parse(format!(
                        "Expected '{} N' as first line, got '{}'",
                        LEAVES_PREFIX, line
                    ))
                })?
                .trim()
                .parse()?
        }
        None => return Err(AlignmentError::parse("Empty linkage table")),
    };
    let header = lines.next().map(|(_, line)| line).transpose()?;
    if header.as_deref().map(str::trim_end) != Some(LINKAGE_HEADER) {
        return Err(AlignmentError::parse(format!(
            "Missing linkage header '{}'",
            LINKAGE_HEADER
        )));
    }

    let mut nodes: Vec<MergeNode> = Vec::with_capacity(leaf_count.saturating_sub(1));
    for (i, line) in lines {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let lineno = i + 1;
        let [node, left, right, distance] = parse_line_fields(line, lineno)?;
        let node: usize = node.parse()?;
        if node != nodes.len() {
            return Err(AlignmentError::parse(format!(
                "Line {}: expected node {}, got {}",
                lineno,
                nodes.len(),
                node
            )));
        }
        let left = NodeRef::from_signed(left.parse()?);
        let right = NodeRef::from_signed(right.parse()?);
        let size_of = |x: NodeRef| match x {
            NodeRef::Leaf(_) => Some(1),
            NodeRef::Node(c) => nodes.get(c).map(|n| n.size),
        };
        let size = match (size_of(left), size_of(right)) {
            (Some(l), Some(r)) => l + r,
            _ => {
                return Err(AlignmentError::parse(format!(
                    "Line {}: node {} refers to a node defined later",
                    lineno, node
                )));
            }
        };
        nodes.push(MergeNode {
            left,
            right,
            distance: distance.parse()?,
            size,
        });
    }

    MergeTree::from_nodes(leaf_count, nodes).ok_or_else(|| {
        AlignmentError::parse(format!(
            "Linkage table does not describe a binary tree over {} leaves",
            leaf_count
        ))
    })
}

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| AlignmentError::Io {
            source: e,
            path: Some(path.to_path_buf()),
        })
}

/// Writes `<stem>_rows.tsv` and `<stem>_linkage.tsv` into `directory`.
///
/// Returns the paths of the two files.
pub fn export(
    directory: &Path,
    stem: &str,
    lists: &[FeatureList],
    tree: &MergeTree,
) -> Result<(PathBuf, PathBuf)> {
    let rows_path = directory.join(format!("{}_rows.tsv", stem));
    let linkage_path = directory.join(format!("{}_linkage.tsv", stem));

    let with_path = |path: &Path| {
        let path = path.to_path_buf();
        move |e: std::io::Error| AlignmentError::Io {
            source: e,
            path: Some(path),
        }
    };

    let mut writer = create_file(&rows_path)?;
    write_leaf_table(&mut writer, lists).map_err(with_path(&rows_path))?;
    writer.flush().map_err(with_path(&rows_path))?;

    let mut writer = create_file(&linkage_path)?;
    write_linkage(&mut writer, tree).map_err(with_path(&linkage_path))?;
    writer.flush().map_err(with_path(&linkage_path))?;

    Ok((rows_path, linkage_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        FeatureRow,
        Sample,
    };

    fn tree() -> MergeTree {
        MergeTree::from_nodes(
            3,
            vec![
                MergeNode {
                    left: NodeRef::Leaf(0),
                    right: NodeRef::Leaf(2),
                    distance: 0.1 + 0.2,
                    size: 2,
                },
                MergeNode {
                    left: NodeRef::Node(0),
                    right: NodeRef::Leaf(1),
                    distance: 1000.0,
                    size: 3,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_linkage_round_trip() {
        let mut buf = Vec::new();
        write_linkage(&mut buf, &tree()).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("1\t-1\t1\t1000\n"));
        let parsed = read_linkage(buf.as_slice()).unwrap();
        assert_eq!(parsed, tree());
    }

    #[test]
    fn test_round_trip_single_leaf() {
        let single = MergeTree::from_nodes(1, vec![]).unwrap();
        let mut buf = Vec::new();
        write_linkage(&mut buf, &single).unwrap();
        assert_eq!(read_linkage(buf.as_slice()).unwrap(), single);
    }

    #[test]
    fn test_read_rejects_malformed() {
        assert!(read_linkage("".as_bytes()).is_err());
        assert!(read_linkage("# leaves: 2\nnode\tleft\tright\tdistance\n0\t0\t0\t1\n".as_bytes()).is_err());
        assert!(read_linkage("# leaves: 2\nnode\tleft\tright\tdistance\n0\t0\t1\n".as_bytes()).is_err());
        assert!(read_linkage("# leaves: 2\nnode\tleft\tright\tdistance\n0\t0\t-2\t1\n".as_bytes()).is_err());
        assert!(read_linkage("leaves 2\n".as_bytes()).is_err());
    }

    #[test]
    fn test_leaf_table_rejects_separators_in_names() {
        for name in ["tab\there", "line\nbreak", "carriage\rreturn"] {
            let lists = vec![FeatureList::new(
                Sample::new(name),
                vec![FeatureRow::new(1, 100.0, 1.0)],
            )];
            let mut buf = Vec::new();
            let err = write_leaf_table(&mut buf, &lists).unwrap_err();
            assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_leaf_table() {
        let lists = vec![
            FeatureList::new(Sample::new("a"), vec![FeatureRow::new(4, 100.5, 2.25)]),
            FeatureList::new(Sample::new("b"), vec![FeatureRow::new(9, 101.0, 3.0)]),
        ];
        let mut buf = Vec::new();
        write_leaf_table(&mut buf, &lists).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "name\tsample\tmz\trt\na#4\ta\t100.5\t2.25\nb#9\tb\t101\t3\n"
        );
    }
}
