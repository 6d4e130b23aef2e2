//! Macros to reduce boilerplate in the codebase

/// Macro to generate Display and FromStr implementations for enums
///
/// The first string is the canonical (displayed) form. Parsing is
/// case-insensitive and also accepts any listed aliases.
///
/// # Usage
///
/// ```rust,ignore
/// enum_display_fromstr!(
///     MyEnum,
///     DeskError::InvalidMyEnum,
///     {
///         Variant1 => "VARIANT_1" | "variant-1",
///         Variant2 => "variant2",
///     }
/// );
/// ```
#[macro_export]
macro_rules! enum_display_fromstr {
    (
        $enum_name:ident,
        $error_variant:path,
        { $($variant:ident => $str:literal $(| $alias:literal)*),+ $(,)? }
    ) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($enum_name::$variant => write!(f, "{}", $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::error::DeskError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($str)
                        $(|| trimmed.eq_ignore_ascii_case($alias))*
                    {
                        return Ok($enum_name::$variant);
                    }
                )+
                Err($error_variant(s.to_string()))
            }
        }
    };
}
