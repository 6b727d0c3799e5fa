//! Per-attribute codecs.
//!
//! Every attribute of a row is a [`Field`]: it renders as one `<name>text</name>`
//! child of a `<row>` element and as a fixed binary layout. Any type with an
//! XML text form ([`XmlText`]) and a binary form ([`BinaryCodec`]) is a field;
//! `Option<T>` is a field for every field `T`.
//!
//! Array text forms carry their shape in front of the values:
//!
//! ```text
//! Vec<T>       1 N v1 ... vN
//! Vec<Vec<T>>  2 N M v11 ... v1M ... vNM
//! ```

use std::fmt::Write as _;

use bytestream::{BinaryCodec, EndianReader, EndianWriter, StreamError};

use crate::error::FieldError;

/// Text form of a value inside an XML element.
pub trait XmlText: Sized {
    fn write_text(&self, out: &mut String);
    fn parse_text(text: &str) -> Result<Self, String>;

    /// Refuses values whose text form would not parse back.
    fn check_text(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A value whose text form is one whitespace-free token, so it can be an
/// array element.
pub trait XmlScalar: XmlText {}

/// One attribute of a row.
pub trait Field: Sized {
    /// Appends `<name>text</name>`. Absent optional values append nothing.
    fn write_xml(&self, name: &str, out: &mut String) -> Result<(), FieldError>;
    fn read_xml(fragment: &str, name: &str) -> Result<Self, FieldError>;
    fn write_bin(&self, w: &mut EndianWriter);
    fn read_bin(r: &mut EndianReader<'_>) -> Result<Self, StreamError>;
}

impl<T: XmlText + BinaryCodec> Field for T {
    fn write_xml(&self, name: &str, out: &mut String) -> Result<(), FieldError> {
        self.check_text().map_err(|message| FieldError::Invalid {
            name: name.to_string(),
            message,
        })?;
        let mut text = String::new();
        self.write_text(&mut text);
        let _ = writeln!(out, "<{name}>{}</{name}>", tagparser::escape(&text));
        Ok(())
    }

    fn read_xml(fragment: &str, name: &str) -> Result<Self, FieldError> {
        let text = tagparser::child_text(fragment, name)?.ok_or_else(|| FieldError::Missing {
            name: name.to_string(),
        })?;
        T::parse_text(&text).map_err(|message| FieldError::Invalid {
            name: name.to_string(),
            message,
        })
    }

    fn write_bin(&self, w: &mut EndianWriter) {
        self.encode(w);
    }

    fn read_bin(r: &mut EndianReader<'_>) -> Result<Self, StreamError> {
        T::decode(r)
    }
}

/// Optional attribute: omitted from XML when absent; a presence flag
/// followed by the value in binary.
impl<T: Field> Field for Option<T> {
    fn write_xml(&self, name: &str, out: &mut String) -> Result<(), FieldError> {
        match self {
            Some(v) => v.write_xml(name, out),
            None => Ok(()),
        }
    }

    fn read_xml(fragment: &str, name: &str) -> Result<Self, FieldError> {
        if tagparser::child_text(fragment, name)?.is_none() {
            return Ok(None);
        }
        T::read_xml(fragment, name).map(Some)
    }

    fn write_bin(&self, w: &mut EndianWriter) {
        w.write_bool(self.is_some());
        if let Some(v) = self {
            v.write_bin(w);
        }
    }

    fn read_bin(r: &mut EndianReader<'_>) -> Result<Self, StreamError> {
        if r.read_bool()? {
            T::read_bin(r).map(Some)
        } else {
            Ok(None)
        }
    }
}

macro_rules! display_text {
    ($($ty:ty),* $(,)?) => {
        $(
            impl XmlText for $ty {
                fn write_text(&self, out: &mut String) {
                    let _ = write!(out, "{self}");
                }

                fn parse_text(text: &str) -> Result<Self, String> {
                    let text = text.trim();
                    text.parse()
                        .map_err(|e| format!("'{text}' is not a valid {}: {e}", stringify!($ty)))
                }
            }

            impl XmlScalar for $ty {}
        )*
    };
}

display_text!(bool, i16, i32, i64, f32, f64);

impl XmlText for String {
    fn write_text(&self, out: &mut String) {
        out.push_str(self);
    }

    fn parse_text(text: &str) -> Result<Self, String> {
        Ok(text.to_string())
    }
}

/// Splits an array text form, checking the leading rank and returning the
/// declared dimensions and the value tokens.
fn array_tokens(text: &str, rank: usize) -> Result<(Vec<usize>, Vec<&str>), String> {
    let mut tokens = text.split_whitespace();
    let declared: usize = tokens
        .next()
        .ok_or("empty array text")?
        .parse()
        .map_err(|_| format!("bad array rank in '{text}'"))?;
    if declared != rank {
        return Err(format!("expected a {rank}-D array, found rank {declared}"));
    }

    let mut dims = Vec::with_capacity(rank);
    for _ in 0..rank {
        let dim: usize = tokens
            .next()
            .ok_or("missing array dimension")?
            .parse()
            .map_err(|_| format!("bad array dimension in '{text}'"))?;
        dims.push(dim);
    }

    let values: Vec<&str> = tokens.collect();
    let expected = dims.iter().product::<usize>();
    if values.len() != expected {
        return Err(format!(
            "array declares {expected} values but {} are present",
            values.len()
        ));
    }
    Ok((dims, values))
}

impl<T: XmlScalar> XmlText for Vec<T> {
    fn write_text(&self, out: &mut String) {
        let _ = write!(out, "1 {}", self.len());
        for v in self {
            out.push(' ');
            v.write_text(out);
        }
    }

    fn parse_text(text: &str) -> Result<Self, String> {
        let (_, values) = array_tokens(text, 1)?;
        values.into_iter().map(T::parse_text).collect()
    }
}

/// Two-dimensional arrays must be rectangular: the column count is taken
/// from the first row, and ragged arrays are refused before rendering.
impl<T: XmlScalar> XmlText for Vec<Vec<T>> {
    fn check_text(&self) -> Result<(), String> {
        let cols = self.first().map_or(0, Vec::len);
        match self.iter().position(|row| row.len() != cols) {
            Some(i) => Err(format!(
                "row {i} of the array has {} values, expected {cols}",
                self[i].len()
            )),
            None => Ok(()),
        }
    }

    fn write_text(&self, out: &mut String) {
        let cols = self.first().map_or(0, Vec::len);
        let _ = write!(out, "2 {} {}", self.len(), cols);
        for v in self.iter().flatten() {
            out.push(' ');
            v.write_text(out);
        }
    }

    fn parse_text(text: &str) -> Result<Self, String> {
        let (dims, values) = array_tokens(text, 2)?;
        let cols = dims[1];
        let flat = values
            .into_iter()
            .map(T::parse_text)
            .collect::<Result<Vec<T>, String>>()?;
        if cols == 0 {
            return Ok((0..dims[0]).map(|_| Vec::new()).collect());
        }
        let mut rows = Vec::with_capacity(dims[0]);
        let mut flat = flat.into_iter();
        for _ in 0..dims[0] {
            rows.push(flat.by_ref().take(cols).collect());
        }
        Ok(rows)
    }
}

/// The attribute tuple of a row: either its key or its values.
///
/// Implemented by [`attributes!`](crate::attributes), which also declares the
/// struct, so the attribute names and their order are fixed at compile time.
pub trait Attributes: Clone + PartialEq + Default + std::fmt::Debug {
    /// XML/binary attribute names in canonical order.
    const NAMES: &'static [&'static str];

    fn write_xml(&self, out: &mut String) -> Result<(), FieldError>;
    fn read_xml(fragment: &str) -> Result<Self, FieldError>;
    fn write_bin(&self, w: &mut EndianWriter);

    /// Decodes attribute `name` into `self`. Returns `Ok(false)` when the
    /// name is not one of [`Attributes::NAMES`].
    fn read_bin_attribute(
        &mut self,
        name: &str,
        r: &mut EndianReader<'_>,
    ) -> Result<bool, StreamError>;
}

/// Declares an attribute tuple struct and implements [`Attributes`] for it.
///
/// ```rust
/// rowstore::attributes! {
///     pub struct BeamKey {
///         antenna_name: String => "antennaName",
///         band: i32 => "receiverBand",
///     }
/// }
///
/// use rowstore::Attributes;
/// assert_eq!(BeamKey::NAMES, &["antennaName", "receiverBand"]);
/// ```
#[macro_export]
macro_rules! attributes {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty => $xml:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default)]
        $vis struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $crate::Attributes for $name {
            const NAMES: &'static [&'static str] = &[$($xml),*];

            fn write_xml(
                &self,
                out: &mut String,
            ) -> ::std::result::Result<(), $crate::FieldError> {
                $( $crate::Field::write_xml(&self.$field, $xml, out)?; )*
                Ok(())
            }

            fn read_xml(fragment: &str) -> ::std::result::Result<Self, $crate::FieldError> {
                Ok(Self {
                    $( $field: $crate::Field::read_xml(fragment, $xml)?, )*
                })
            }

            fn write_bin(&self, w: &mut $crate::bytestream::EndianWriter) {
                $( $crate::Field::write_bin(&self.$field, w); )*
            }

            fn read_bin_attribute(
                &mut self,
                name: &str,
                r: &mut $crate::bytestream::EndianReader<'_>,
            ) -> ::std::result::Result<bool, $crate::bytestream::StreamError> {
                match name {
                    $(
                        $xml => {
                            self.$field = $crate::Field::read_bin(r)?;
                            Ok(true)
                        }
                    )*
                    _ => Ok(false),
                }
            }
        }
    };
}

/// Declares a closed enumeration usable as an attribute. The first variant
/// is the default. XML and binary forms both use the variant's name.
///
/// ```rust
/// rowstore::enumeration! {
///     pub enum Polarization { X => "X", Y => "Y" }
/// }
///
/// assert_eq!("Y".parse::<Polarization>().unwrap(), Polarization::Y);
/// assert_eq!(Polarization::default(), Polarization::X);
/// ```
#[macro_export]
macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident => $first_text:literal $(, $variant:ident => $text:literal )* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis enum $name {
            #[default]
            $first,
            $( $variant, )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$name::$first $(, $name::$variant)*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $name::$first => $first_text,
                    $( $name::$variant => $text, )*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim() {
                    $first_text => Ok($name::$first),
                    $( $text => Ok($name::$variant), )*
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl $crate::XmlText for $name {
            fn write_text(&self, out: &mut String) {
                out.push_str(self.as_str());
            }

            fn parse_text(text: &str) -> ::std::result::Result<Self, String> {
                text.parse()
            }
        }

        impl $crate::XmlScalar for $name {}

        impl $crate::bytestream::BinaryCodec for $name {
            fn encode(&self, w: &mut $crate::bytestream::EndianWriter) {
                w.write_string(self.as_str());
            }

            fn decode(
                r: &mut $crate::bytestream::EndianReader<'_>,
            ) -> ::std::result::Result<Self, $crate::bytestream::StreamError> {
                let offset = r.position();
                let s = r.read_string()?;
                s.parse().map_err(|message| {
                    $crate::bytestream::StreamError::InvalidValue { offset, message }
                })
            }
        }
    };
}
