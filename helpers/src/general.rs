use std::cmp::Ordering;
use std::error::Error;
use std::fmt;

/// InputValueError is used if some simulation option or parameter does not fulfill the posed
/// requirements, e.g., a lineup that is larger than the roster it is drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueError {
    pub parameter: String,
    pub reason: String,
}

impl InputValueError {
    pub fn new(parameter: &str, reason: &str) -> InputValueError {
        InputValueError {
            parameter: parameter.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

impl fmt::Display for InputValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid input value for {}: {}", self.parameter, self.reason)
    }
}

impl Error for InputValueError {}

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array. Incomparable pairs (NaN) are treated as
/// equal, the sort is stable.
pub fn argsort<T: PartialOrd>(x: &[T], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => {
            indices.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap_or(Ordering::Equal))
        }
        SortOrder::Descending => {
            indices.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap_or(Ordering::Equal))
        }
    }
    indices
}

/// argmin returns the index of the minimum value in the array x, or None for an empty array.
/// The first index wins on ties.
pub fn argmin<T: PartialOrd + Copy>(x: &[T]) -> Option<usize> {
    let mut iter = x.iter().enumerate();
    let (mut idx_min, &first) = iter.next()?;
    let mut val_min = first;

    for (i, &val) in iter {
        if val < val_min {
            val_min = val;
            idx_min = i;
        }
    }

    Some(idx_min)
}

/// mean returns the arithmetic mean of x, or None for an empty array.
pub fn mean(x: &[f64]) -> Option<f64> {
    if x.is_empty() {
        None
    } else {
        Some(x.iter().sum::<f64>() / x.len() as f64)
    }
}
