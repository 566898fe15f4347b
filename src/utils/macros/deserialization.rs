//! Case-insensitive deserialization for `{ "type": ..., "value": ... }` enums.

/// Implements `Deserialize` for an enum of single-string variants written as
/// `{ "type": "<variant>", "value": "<string>" }`, matching the `type` tag
/// case-insensitively.
///
/// An optional trailing `bare => Variant` arm also accepts a plain JSON/YAML
/// string and maps it to `Variant`, so configuration files can write
/// `slackBotToken: xoxb-...` instead of the tagged form.
#[macro_export]
macro_rules! impl_case_insensitive_enum {
    ($enum_name:ident, { $($variant_str:expr => $variant:ident),* $(,)? } $(, bare => $bare:ident)?) => {
        impl<'de> ::serde::Deserialize<'de> for $enum_name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                use ::serde::de::{self, MapAccess, Visitor};
                use std::fmt;

                struct EnumVisitor;

                impl<'de> Visitor<'de> for EnumVisitor {
                    type Value = $enum_name;

                    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                        formatter.write_str(concat!("a `type`/`value` map for ", stringify!($enum_name)))
                    }

                    $(
                        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                        where
                            E: de::Error,
                        {
                            Ok($enum_name::$bare(v.to_string().into()))
                        }
                    )?

                    fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
                    where
                        M: MapAccess<'de>,
                    {
                        let mut type_: Option<String> = None;
                        let mut value: Option<String> = None;

                        while let Some(key) = map.next_key::<String>()? {
                            match key.as_str() {
                                "type" => type_ = Some(map.next_value()?),
                                "value" => value = Some(map.next_value()?),
                                _ => {
                                    let _: de::IgnoredAny = map.next_value()?;
                                }
                            }
                        }

                        let type_ = type_.ok_or_else(|| de::Error::missing_field("type"))?;
                        let value = value.ok_or_else(|| de::Error::missing_field("value"))?;

                        match type_.to_lowercase().as_str() {
                            $(
                                $variant_str => Ok($enum_name::$variant(value.into())),
                            )*
                            _ => Err(de::Error::unknown_variant(&type_, &[$($variant_str),*])),
                        }
                    }
                }

                deserializer.deserialize_any(EnumVisitor)
            }
        }
    };
}
