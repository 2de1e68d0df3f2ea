pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

/// Checks that `count` bytes starting at `offset` fit into a buffer of `len` bytes.
///
/// The checks run in a fixed order (negative offset, negative count, overrun) and the
/// first failing one is reported.
#[inline]
pub fn verify_range(offset: i64, count: i64, len: usize) -> Result<()> {
    if offset < 0 {
        return out_of_bounds("offset < 0", offset, count, len);
    }
    if count < 0 {
        return out_of_bounds("count < 0", offset, count, len);
    }
    if count > len as i64 - offset {
        return out_of_bounds("count > len - offset", offset, count, len);
    }
    Ok(())
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::Error::invalid_arg(name, condition))
}

#[cold]
fn out_of_bounds(condition: &str, offset: i64, count: i64, len: usize) -> Result<()> {
    Err(crate::error::Error::index_out_of_bounds(
        condition, offset, count, len,
    ))
}
