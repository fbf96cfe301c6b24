//! Closed string-valued enums (status columns, type columns).

/// Declare an enum whose variants serialize to fixed strings.
///
/// Generates `ALL`, `VALUES` (the wire names, usable in `in:` rules and
/// check constraints), `as_str`, `Display` and `FromStr`.
#[macro_export]
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $t:ident {
            $($variant:ident => $name:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Copy, Clone, PartialEq, Eq, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        $vis enum $t {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl $t {
            pub const ALL: &'static [$t] = &[$($t::$variant),+];
            pub const VALUES: &'static [&'static str] = &[$($name),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($t::$variant => $name,)+
                }
            }
        }

        impl ::core::fmt::Display for $t {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $t {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($t::$variant),)+
                    other => Err($crate::DomainError::validation(format!(
                        "unknown {} '{}'",
                        stringify!($t),
                        other
                    ))),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    string_enum! {
        enum Shade {
            Light => "light",
            Dark => "dark",
        }
    }

    #[test]
    fn values_follow_declaration_order() {
        assert_eq!(Shade::VALUES, &["light", "dark"]);
        assert_eq!(Shade::ALL.len(), 2);
    }

    #[test]
    fn parses_and_serializes_wire_names() {
        assert_eq!("dark".parse::<Shade>().unwrap(), Shade::Dark);
        assert!("grey".parse::<Shade>().is_err());
        assert_eq!(serde_json::to_value(Shade::Light).unwrap(), "light");
        assert_eq!(Shade::Dark.to_string(), "dark");
    }
}
