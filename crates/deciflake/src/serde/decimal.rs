use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serde helpers for storing an identifier as its native integer.
///
/// ```
/// use deciflake::{DeciflakeId, as_native};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Order {
///     #[serde(with = "as_native")]
///     id: DeciflakeId,
/// }
/// ```
pub mod as_native {
    use super::{Deserialize, Deserializer, Serialize, Serializer};
    use crate::{DecimalId, Error};

    /// Serialize an identifier as its native integer representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<ID, S>(id: &ID, s: S) -> Result<S::Ok, S::Error>
    where
        ID: DecimalId,
        ID::Ty: Serialize,
        S: Serializer,
    {
        id.to_raw().serialize(s)
    }

    /// Deserialize an identifier from its native integer representation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The underlying deserializer fails
    /// - The value has more digits than the layout is wide
    pub fn deserialize<'de, ID, D>(d: D) -> Result<ID, D::Error>
    where
        ID: DecimalId,
        ID::Ty: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let n = <ID::Ty>::deserialize(d)?;
        let id = ID::from_raw(n);
        if !id.is_valid() {
            return Err(serde::de::Error::custom(Error::DecodeOverflow));
        }
        Ok(id)
    }
}

/// Serde helpers for storing an identifier as fixed-width decimal text.
///
/// Text keeps leading zeros and survives JSON consumers that parse numbers
/// as doubles.
pub mod as_padded {
    use super::{Deserializer, Serializer};
    use crate::DecimalId;

    /// Serialize an identifier as a zero-padded decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<ID, S>(id: &ID, s: S) -> Result<S::Ok, S::Error>
    where
        ID: DecimalId,
        S: Serializer,
    {
        s.serialize_str(&id.to_padded_string())
    }

    /// Deserialize an identifier from decimal text.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The underlying deserializer fails
    /// - The text contains anything but ASCII digits
    /// - The text does not fit the layout width
    pub fn deserialize<'de, ID, D>(d: D) -> Result<ID, D::Error>
    where
        ID: DecimalId,
        D: Deserializer<'de>,
    {
        struct PaddedVisitor<ID>(core::marker::PhantomData<ID>);

        impl<ID> serde::de::Visitor<'_> for PaddedVisitor<ID>
        where
            ID: DecimalId,
        {
            type Value = ID;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a decimal identifier string")
            }

            #[inline]
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<ID>().map_err(serde::de::Error::custom)
            }
        }

        d.deserialize_str(PaddedVisitor(core::marker::PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecimalId, DeciflakeId, Error};
    use serde_json::json;

    #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
    struct NativeRow {
        #[serde(with = "as_native")]
        event_id: DeciflakeId,
    }

    #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
    struct PaddedRow {
        #[serde(with = "as_padded")]
        event_id: DeciflakeId,
    }

    #[test]
    fn native_roundtrip() {
        let row = NativeRow {
            event_id: DeciflakeId::from(1000, 7, 1000),
        };

        let json = serde_json::to_string(&row).expect("serialize");
        assert_eq!(json, r#"{"event_id":100000071000}"#);
        let back: NativeRow = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, row);
    }

    #[test]
    fn native_rejects_values_wider_than_layout() {
        let err = serde_json::from_str::<NativeRow>(r#"{"event_id":100000000000000000000}"#)
            .expect_err("should fail");
        assert!(err.to_string().contains(&Error::DecodeOverflow.to_string()));
    }

    #[test]
    fn padded_roundtrip() {
        let row = PaddedRow {
            event_id: DeciflakeId::from(1000, 7, 1000),
        };

        let value = serde_json::to_value(&row).expect("serialize");
        assert_eq!(value, json!({"event_id": "00000000100000071000"}));
        let back: PaddedRow = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, row);
    }

    #[test]
    fn padded_accepts_unpadded_text() {
        let row: PaddedRow =
            serde_json::from_value(json!({"event_id": "100000071000"})).expect("deserialize");
        assert_eq!(row.event_id.decompose(), (1000, 7, 1000));
    }

    #[test]
    fn padded_rejects_bad_text() {
        let err = serde_json::from_value::<PaddedRow>(json!({"event_id": "12a4"}))
            .expect_err("should fail");
        assert_eq!(
            err.to_string(),
            Error::InvalidDigit { position: 2 }.to_string()
        );

        let err = serde_json::from_value::<PaddedRow>(json!({"event_id": "123456789012345678901"}))
            .expect_err("should fail");
        assert_eq!(err.to_string(), Error::DecodeOverflow.to_string());
    }
}
