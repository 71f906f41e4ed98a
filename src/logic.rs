//! Set algebra over saved result lists.
//!
//! The operations are generic over a caller-supplied equivalence so that "same
//! element" can mean [`crate::equivalence::equivalent`] rather than `==`. Output
//! order is always the left-to-right traversal of the inputs, keeping the first
//! occurrence of each equivalence class.

use crate::equivalence::equivalent;
use crate::error::{IeeeError, Result};
use crate::record::Record;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Operator combining two or more lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Merge,
    And,
    Or,
}

impl SetOperator {
    pub fn name(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every element found in any list, duplicates collapsed to the first seen.
pub fn union_with<T, F>(lists: &[Vec<T>], eq: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let mut result: Vec<T> = Vec::new();
    for item in lists.iter().flatten() {
        if !result.iter().any(|kept| eq(kept, item)) {
            result.push(item.clone());
        }
    }
    result
}

/// Elements of the first list that have an equivalent in every other list,
/// duplicates collapsed to the first seen.
pub fn intersection_with<T, F>(lists: &[Vec<T>], eq: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };

    let mut result: Vec<T> = Vec::new();
    for item in first {
        let in_all = rest
            .iter()
            .all(|list| list.iter().any(|other| eq(item, other)));
        if in_all && !result.iter().any(|kept| eq(kept, item)) {
            result.push(item.clone());
        }
    }
    result
}

/// Elements of `base` with no equivalent in `subtract`, in their original order.
pub fn difference_with<T, F>(base: &[T], subtract: &[T], eq: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    base.iter()
        .filter(|item| !subtract.iter().any(|other| eq(*item, other)))
        .cloned()
        .collect()
}

/// Apply `operator` to `lists`, then subtract `not` if given.
///
/// Without an operator, `not` is subtracted from the single list in `lists`.
///
/// # Errors
///
/// [`IeeeError::InsufficientOperands`] when an operator gets fewer than two lists,
/// when `not` is used alone with anything but exactly one list, or when neither an
/// operator nor `not` is given.
pub fn combine<T, F>(
    operator: Option<SetOperator>,
    lists: &[Vec<T>],
    not: Option<&[T]>,
    eq: F,
) -> Result<Vec<T>>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    check_arity(operator, lists.len(), not.is_some())?;

    let combined = match operator {
        Some(SetOperator::Merge | SetOperator::Or) => union_with(lists, &eq),
        Some(SetOperator::And) => intersection_with(lists, &eq),
        None => lists.first().cloned().unwrap_or_default(),
    };

    Ok(match not {
        Some(subtract) => difference_with(&combined, subtract, &eq),
        None => combined,
    })
}

fn check_arity(operator: Option<SetOperator>, lists: usize, has_not: bool) -> Result<()> {
    match operator {
        Some(op) if lists < 2 => Err(IeeeError::InsufficientOperands {
            operator: op.name(),
            needed: "at least two files",
            got: lists,
        }),
        None if !has_not => Err(IeeeError::InsufficientOperands {
            operator: "none",
            needed: "at least one operator",
            got: lists,
        }),
        None if lists != 1 => Err(IeeeError::InsufficientOperands {
            operator: "not",
            needed: "a single input file when used alone",
            got: lists,
        }),
        _ => Ok(()),
    }
}

/// A combination over saved result files.
#[derive(Debug, Clone, Default)]
pub struct LogicRequest {
    /// Operator applied to `inputs`
    pub operator: Option<SetOperator>,
    /// Input files, in order
    pub inputs: Vec<PathBuf>,
    /// File subtracted from the result
    pub not: Option<PathBuf>,
}

/// Load the files of `request` and combine them under record equivalence.
///
/// # Errors
///
/// [`IeeeError::MissingFile`] naming the first input that does not exist; other
/// read and JSON errors as-is.
pub fn combine_files(request: &LogicRequest) -> Result<Vec<Record>> {
    check_arity(request.operator, request.inputs.len(), request.not.is_some())?;

    let lists = request
        .inputs
        .iter()
        .map(|path| load_records(path))
        .collect::<Result<Vec<_>>>()?;
    let not = request.not.as_deref().map(load_records).transpose()?;

    let result = combine(request.operator, &lists, not.as_deref(), equivalent)?;
    info!(
        operator = ?request.operator,
        inputs = lists.len(),
        subtracted = not.is_some(),
        total = result.len(),
        "Combined result files"
    );
    Ok(result)
}

/// Read a saved JSON array of records.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => IeeeError::MissingFile(path.to_path_buf()),
        _ => IeeeError::Io(e),
    })?;
    let records: Vec<Record> = serde_json::from_str(&content)?;
    debug!(path = %path.display(), count = records.len(), "Loaded records");
    Ok(records)
}
