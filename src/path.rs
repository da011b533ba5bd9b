//! Dotted-path access into value trees.
//!
//! A path is a sequence of member names separated by `.`, where any segment
//! may be followed by one or more `[n]` element indexes: `a.b[2].c`. A
//! leading `.` is tolerated and ignored.
//!
//! The read side degrades like the rest of the read API: any miss along the
//! way yields the null sentinel. The write side is strict and reports which
//! step failed.

use crate::error::{Error, Result};
use crate::value::Value;

enum Segment<'a> {
    Member(&'a str),
    Index(usize),
}

fn parse_segments(path: &str) -> std::result::Result<Vec<Segment<'_>>, String> {
    let mut segments = Vec::new();
    let bytes = path.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'.' => i += 1,
            b'[' => {
                let close = path[i..]
                    .find(']')
                    .ok_or_else(|| "unterminated '[' index".to_string())?
                    + i;
                let index: usize = path[i + 1..close]
                    .parse()
                    .map_err(|_| format!("bad index {:?}", &path[i + 1..close]))?;
                segments.push(Segment::Index(index));
                i = close + 1;
            }
            _ => {
                let mut end = i;
                while end < bytes.len() && bytes[end] != b'.' && bytes[end] != b'[' {
                    end += 1;
                }
                segments.push(Segment::Member(&path[i..end]));
                i = end;
            }
        }
    }

    Ok(segments)
}

/// Follows `path` from `root`, returning the value it names.
///
/// Any miss — a member that doesn't exist, an index past the end, a segment
/// applied to the wrong kind, or a malformed path — yields a null value.
///
/// # Examples
///
/// ```rust
/// use valon::member_path;
///
/// let doc = valon::from_str(r#"{ servers: [{ host: "a" }, { host: "b" }] }"#).unwrap();
/// assert_eq!(member_path(&doc, "servers[1].host").as_str(""), "b");
/// assert!(member_path(&doc, "servers[9].host").is_null());
/// ```
#[must_use]
pub fn member_path<'a>(root: &'a Value, path: &str) -> &'a Value {
    static NULL: Value = Value::Null;

    let Ok(segments) = parse_segments(path) else {
        return &NULL;
    };

    let mut current = root;
    for segment in &segments {
        current = match segment {
            Segment::Member(name) => current.member(name),
            Segment::Index(i) => current.elt(*i),
        };
    }
    current
}

/// Follows `path` from `root` for writing, inserting members along the way.
///
/// Missing members auto-vivify as null (and null values promote to objects),
/// matching [`Value::update_member`]. Indexes never grow arrays; a segment
/// applied to a value of the wrong kind, or an out-of-range index, is an
/// error naming the failure.
pub fn update_member_path<'a>(root: &'a mut Value, path: &str) -> Result<&'a mut Value> {
    let segments = parse_segments(path).map_err(|msg| Error::InvalidPath {
        path: path.to_string(),
        msg,
    })?;

    if segments.is_empty() {
        return Err(Error::InvalidPath {
            path: path.to_string(),
            msg: "empty path".to_string(),
        });
    }

    let mut current = root;
    for segment in &segments {
        current = match segment {
            Segment::Member(name) => current.update_member(name)?,
            Segment::Index(i) => current.elt_mut(*i)?,
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        let mut v = Value::Null;
        let inner = v.update_member("a").unwrap();
        inner.set_member("b", Value::from(vec![Value::from(10), Value::from(20)])).unwrap();
        v
    }

    #[test]
    fn read_follows_members_and_indexes() {
        let v = sample();
        assert_eq!(member_path(&v, "a.b[1]").as_i32(0), 20);
        assert_eq!(member_path(&v, ".a.b[0]").as_i32(0), 10);
    }

    #[test]
    fn read_misses_yield_null() {
        let v = sample();
        assert!(member_path(&v, "a.c").is_null());
        assert!(member_path(&v, "a.b[5]").is_null());
        assert!(member_path(&v, "a.b[x]").is_null());
        assert!(member_path(&v, "a.b[1].deeper").is_null());
    }

    #[test]
    fn write_auto_vivifies_members() {
        let mut v = Value::Null;
        *update_member_path(&mut v, "x.y.z").unwrap() = Value::from(7);
        assert_eq!(member_path(&v, "x.y.z").as_i32(0), 7);
    }

    #[test]
    fn write_reports_failures() {
        let mut v = sample();
        assert!(matches!(
            update_member_path(&mut v, "a.b[9]"),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            update_member_path(&mut v, "a.b[0].name"),
            Err(Error::InvalidAccess { .. })
        ));
        assert!(matches!(
            update_member_path(&mut v, "a.b[zz]"),
            Err(Error::InvalidPath { .. })
        ));
    }
}
