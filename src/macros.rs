/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Keys are string literals; values may be literals, nested `[...]` / `{...}`
/// forms, or parenthesized expressions.
///
/// # Examples
///
/// ```rust
/// use valon::valon;
///
/// let v = valon!({
///     "name": "Alice",
///     "age": 30,
///     "tags": ["rust", "json"]
/// });
///
/// assert_eq!(v["name"].as_str(""), "Alice");
/// assert_eq!(v["tags"].num_elts(), 2);
/// ```
#[macro_export]
macro_rules! valon {
    // Handle null
    (null) => {
        $crate::Value::Null
    };

    // Handle empty array
    ([]) => {
        $crate::Value::from(Vec::<$crate::Value>::new())
    };

    // Handle non-empty array
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::from(vec![$($crate::valon!($elem)),*])
    };

    // Handle empty object
    ({}) => {
        $crate::Value::from($crate::ValueMap::new())
    };

    // Handle non-empty object
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::ValueMap::new();
        $(
            object.insert($key, $crate::valon!($value));
        )*
        $crate::Value::from(object)
    }};

    // Fallback: anything `Value: From` accepts
    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Value, ValueMap};

    #[test]
    fn primitives() {
        assert_eq!(valon!(null), Value::Null);
        assert_eq!(valon!(true), Value::Bool(true));
        assert_eq!(valon!(false), Value::Bool(false));
        assert_eq!(valon!(42), Value::Int(42));
        assert_eq!(valon!(3.5), Value::Double(3.5));
        assert_eq!(valon!("hello"), Value::from("hello"));
    }

    #[test]
    fn arrays() {
        assert_eq!(valon!([]), Value::from(Vec::new()));

        let arr = valon!([1, 2.5, "three"]);
        assert_eq!(arr.num_elts(), 3);
        assert_eq!(arr.elt(0), &Value::Int(1));
        assert_eq!(arr.elt(1), &Value::Double(2.5));
        assert_eq!(arr.elt(2), &Value::from("three"));
    }

    #[test]
    fn objects() {
        assert_eq!(valon!({}), Value::from(ValueMap::new()));

        let obj = valon!({
            "name": "Alice",
            "age": 30,
            "tags": ["rust", "json"],
        });

        assert_eq!(obj.num_members(), 3);
        assert_eq!(obj["name"].as_str(""), "Alice");
        assert_eq!(obj["age"].as_i32(0), 30);
        assert_eq!(obj["tags"].elt(1).as_str(""), "json");
    }

    #[test]
    fn nesting_and_expressions() {
        let n = 6 * 7;
        let v = valon!({ "outer": { "inner": [(n), null] } });
        assert_eq!(v["outer"]["inner"].elt(0).as_i32(0), 42);
        assert!(v["outer"]["inner"].elt(1).is_null());
    }
}
