//! Zero-value detection shared by every field type.
//!
//! A value is zero when it is indistinguishable from the value its type has without explicit
//! initialization: `0`, `""`, `false`, `None`, an empty container, an all-zero `ObjectId`,
//! the epoch `DateTime`, or a struct whose fields are all zero. Structs opt in with
//! `#[derive(IsZero)]`.

use bson::{Bson, DateTime, Document, oid::ObjectId};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    rc::Rc,
    sync::Arc,
    time::Duration,
};

/// Capability to tell whether a value equals the default value of its type.
pub trait IsZero {
    /// Returns `true` if this value is the zero value of its type.
    fn is_zero(&self) -> bool;
}

macro_rules! impl_is_zero_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IsZero for $ty {
                fn is_zero(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

impl_is_zero_numeric!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

// Bit comparison keeps -0.0 distinct from the zero value.
impl IsZero for f32 {
    fn is_zero(&self) -> bool {
        self.to_bits() == 0
    }
}

impl IsZero for f64 {
    fn is_zero(&self) -> bool {
        self.to_bits() == 0
    }
}

impl IsZero for bool {
    fn is_zero(&self) -> bool {
        !*self
    }
}

impl IsZero for char {
    fn is_zero(&self) -> bool {
        *self == '\0'
    }
}

impl IsZero for () {
    fn is_zero(&self) -> bool {
        true
    }
}

impl IsZero for str {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl IsZero for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl IsZero for Duration {
    fn is_zero(&self) -> bool {
        Duration::is_zero(self)
    }
}

impl<T> IsZero for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: IsZero + ?Sized> IsZero for &T {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: IsZero + ?Sized> IsZero for Box<T> {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: IsZero + ?Sized> IsZero for Rc<T> {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: IsZero + ?Sized> IsZero for Arc<T> {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: IsZero, const N: usize> IsZero for [T; N] {
    fn is_zero(&self) -> bool {
        self.iter().all(|item| item.is_zero())
    }
}

impl<T> IsZero for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsZero for VecDeque<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> IsZero for HashMap<K, V, S> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsZero for BTreeMap<K, V> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T, S> IsZero for HashSet<T, S> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsZero for BTreeSet<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl IsZero for ObjectId {
    fn is_zero(&self) -> bool {
        self.bytes() == [0; 12]
    }
}

impl IsZero for DateTime {
    fn is_zero(&self) -> bool {
        self.timestamp_millis() == 0
    }
}

impl IsZero for Document {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl IsZero for Bson {
    fn is_zero(&self) -> bool {
        match self {
            Bson::Null | Bson::Undefined => true,
            Bson::Boolean(value) => value.is_zero(),
            Bson::Int32(value) => value.is_zero(),
            Bson::Int64(value) => value.is_zero(),
            Bson::Double(value) => value.is_zero(),
            Bson::String(value) => value.is_zero(),
            Bson::Array(values) => values.is_zero(),
            Bson::Document(document) => document.is_zero(),
            Bson::ObjectId(oid) => oid.is_zero(),
            Bson::DateTime(datetime) => datetime.is_zero(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn scalars() {
        assert!(0_i64.is_zero());
        assert!(!7_u8.is_zero());
        assert!(0.0_f64.is_zero());
        assert!(!(-0.0_f64).is_zero());
        assert!(false.is_zero());
        assert!(!true.is_zero());
        assert!('\0'.is_zero());
    }

    #[test]
    fn strings_and_containers() {
        assert!(String::new().is_zero());
        assert!(!"x".is_zero());
        assert!(Vec::<i32>::new().is_zero());
        assert!(!vec![0].is_zero());
        assert!(HashMap::<String, i32>::new().is_zero());
        assert!(!HashMap::from([("a".to_string(), 0)]).is_zero());
        assert!([0_u8; 4].is_zero());
        assert!(![0_u8, 1].is_zero());
    }

    #[test]
    fn references_and_options() {
        assert!(None::<String>.is_zero());
        assert!(!Some(String::new()).is_zero());
        assert!(Box::new(0_i32).is_zero());
        assert!(Arc::new(String::new()).is_zero());
        assert!((&&0_u32).is_zero());
    }

    #[test]
    fn bson_types() {
        assert!(ObjectId::from_bytes([0; 12]).is_zero());
        assert!(!ObjectId::new().is_zero());
        assert!(DateTime::from_millis(0).is_zero());
        assert!(!DateTime::now().is_zero());
        assert!(Document::new().is_zero());
        assert!(!doc! { "a": 0 }.is_zero());
        assert!(Bson::Null.is_zero());
        assert!(Bson::Int32(0).is_zero());
        assert!(!Bson::String("a".into()).is_zero());
    }
}
