//! Nested file collections and their expansion into flag/value tokens.

use serde::{Deserialize, Serialize};

use crate::error::StepResult;
use crate::flags::{classify, FileRole};

/// A file name or an ordered group of them.
///
/// Steps often hand over logically related files together, e.g. a BAM and its
/// index, so groups may nest arbitrarily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileTree {
    /// A single file name.
    File(String),
    /// An ordered group of files or further groups.
    Group(Vec<FileTree>),
}

impl FileTree {
    /// Creates an empty group.
    pub fn empty() -> Self {
        FileTree::Group(Vec::new())
    }

    /// Returns every file name, depth-first, in the order supplied.
    pub fn flatten(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FileTree::File(name) => out.push(name),
            FileTree::Group(items) => {
                for item in items {
                    item.collect_into(out);
                }
            }
        }
    }

    /// Returns true if the tree holds no file names at all.
    pub fn is_empty(&self) -> bool {
        match self {
            FileTree::File(_) => false,
            FileTree::Group(items) => items.iter().all(FileTree::is_empty),
        }
    }
}

impl From<&str> for FileTree {
    fn from(name: &str) -> Self {
        FileTree::File(name.to_string())
    }
}

impl From<String> for FileTree {
    fn from(name: String) -> Self {
        FileTree::File(name)
    }
}

impl<T: Into<FileTree>> From<Vec<T>> for FileTree {
    fn from(items: Vec<T>) -> Self {
        FileTree::Group(items.into_iter().map(Into::into).collect())
    }
}

/// Expands files into `flag, value, flag, value, ...` tokens for the job script.
///
/// The tree is flattened depth-first before classification, so the caller's
/// ordering is preserved exactly. An empty collection yields no tokens.
///
/// # Example
/// ```
/// use stepjob_spec::files::{marshal, FileTree};
/// use stepjob_spec::flags::FileRole;
///
/// let files = FileTree::from(vec!["a.bam", "b.bai"]);
/// assert_eq!(marshal(&files, FileRole::Output).unwrap(), ["-c", "a.bam", "-d", "b.bai"]);
/// ```
pub fn marshal(files: &FileTree, role: FileRole) -> StepResult<Vec<String>> {
    let names = files.flatten();
    let mut tokens = Vec::with_capacity(names.len() * 2);
    for name in names {
        let flag = classify(name, role)?;
        tokens.push(String::from(flag));
        tokens.push(name.to_string());
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StepError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_marshal_empty() {
        assert!(marshal(&FileTree::empty(), FileRole::Input).unwrap().is_empty());
        let nested_empty = FileTree::Group(vec![FileTree::empty(), FileTree::empty()]);
        assert!(nested_empty.is_empty());
        assert!(marshal(&nested_empty, FileRole::Output).unwrap().is_empty());
    }

    #[test]
    fn test_marshal_preserves_order() {
        let files = FileTree::from(vec!["a.bam", "b.bai"]);
        assert_eq!(
            marshal(&files, FileRole::Output).unwrap(),
            vec!["-c", "a.bam", "-d", "b.bai"]
        );
    }

    #[test]
    fn test_marshal_flattens_depth_first() {
        let files = FileTree::Group(vec![
            FileTree::from("ref.fa"),
            FileTree::from(vec!["s1.bam", "s1.bai"]),
            FileTree::Group(vec![FileTree::from(vec!["calls.vcf.gz"])]),
        ]);
        assert_eq!(
            files.flatten(),
            vec!["ref.fa", "s1.bam", "s1.bai", "calls.vcf.gz"]
        );
        assert_eq!(
            marshal(&files, FileRole::Output).unwrap(),
            vec!["-g", "ref.fa", "-c", "s1.bam", "-d", "s1.bai", "-w", "calls.vcf.gz"]
        );
    }

    #[test]
    fn test_marshal_single_file() {
        let files = FileTree::from("x.fq");
        assert_eq!(marshal(&files, FileRole::Input).unwrap(), vec!["--fq", "x.fq"]);
    }

    #[test]
    fn test_marshal_stops_on_first_unrecognized() {
        let files = FileTree::from(vec!["a.bam", "b.bai"]);
        let err = marshal(&files, FileRole::Input).unwrap_err();
        assert!(matches!(err, StepError::UnrecognizedExtension { ref extension, .. } if extension == ".bai"));
    }

    #[test]
    fn test_file_tree_deserializes_from_nested_json() {
        let tree: FileTree = serde_json::from_str(r#"["a.bam", ["b.bam", "b.bai"]]"#).unwrap();
        assert_eq!(tree.flatten(), vec!["a.bam", "b.bam", "b.bai"]);
        let single: FileTree = serde_json::from_str(r#""only.fa""#).unwrap();
        assert_eq!(single, FileTree::from("only.fa"));
    }
}
