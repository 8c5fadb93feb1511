//! Newtype IDs for type-safe entity references.
//!
//! The backend identifies every record with an opaque string (a 24-character
//! hex object id in practice). Use the `define_id!` macro to create type-safe
//! wrappers that prevent accidentally mixing IDs from different entity types.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `short()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use mobistore_core::define_id;
/// define_id!(WidgetId);
/// define_id!(GadgetId);
///
/// let widget = WidgetId::new("65f1c0ffee");
/// let gadget = GadgetId::new("65f1c0ffee");
///
/// // These are different types, so this won't compile:
/// // let _: WidgetId = gadget;
/// assert_eq!(widget.as_str(), gadget.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The last eight characters, used as a human-friendly reference.
            #[must_use]
            pub fn short(&self) -> &str {
                let start = self
                    .0
                    .char_indices()
                    .rev()
                    .nth(7)
                    .map_or(0, |(idx, _)| idx);
                self.0.get(start..).unwrap_or(&self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(ProductId);
define_id!(VariantId);
define_id!(ColorVariantId);
define_id!(CartItemId);
define_id!(OrderId);
define_id!(AddressId);
define_id!(CommentId);
define_id!(ReplyId);
define_id!(NewsId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_takes_last_eight_chars() {
        let id = OrderId::new("65f1a2b3c4d5e6f708192a3b");
        assert_eq!(id.short(), "08192a3b");
    }

    #[test]
    fn test_short_on_short_id() {
        let id = OrderId::new("abc");
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProductId::new("p1");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"p1\""));
    }
}
