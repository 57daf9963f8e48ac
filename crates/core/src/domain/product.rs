use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Stored `isActive` value.
///
/// Kept as raw JSON so records written with a non-boolean flag survive a
/// load/save cycle unchanged. Only the exact boolean `true` counts as active.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveFlag(Value);

impl ActiveFlag {
    pub fn is_true(&self) -> bool {
        matches!(self.0, Value::Bool(true))
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.0.as_bool()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<bool> for ActiveFlag {
    fn from(value: bool) -> Self {
        Self(Value::Bool(value))
    }
}

impl From<Value> for ActiveFlag {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

const PRODUCT_ID: &str = "productId";
const PRODUCT_NAME: &str = "productName";
const PRODUCT_DESCRIPTION: &str = "productDescription";
const IS_ACTIVE: &str = "isActive";
const IMAGE_PATH: &str = "imagePath";

/// One stored record.
///
/// Missing text fields read as empty strings. A text field stored as some
/// other JSON value (a number, `null`, an object) keeps that value in
/// `attributes` under its own key and is written back unchanged; the typed
/// field stays empty until a patch sets it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Product {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_description: String,
    pub is_active: ActiveFlag,
    pub image_path: String,
    /// Keys written by other tools; carried through untouched.
    pub attributes: Map<String, Value>,
}

impl Product {
    pub fn has_image(&self) -> bool {
        !self.image_path.is_empty() && !self.attributes.contains_key(IMAGE_PATH)
    }

    /// Whether lookups by `product_id` select this record. A non-string stored
    /// id never equals a requested id.
    pub fn matches(&self, product_id: &ProductId) -> bool {
        &self.product_id == product_id && !self.attributes.contains_key(PRODUCT_ID)
    }

    /// Applies every field present in `patch`, leaving the rest as they were.
    pub fn merge(&mut self, patch: ProductPatch) {
        if let Some(product_id) = patch.product_id {
            self.attributes.remove(PRODUCT_ID);
            self.product_id = product_id;
        }
        if let Some(product_name) = patch.product_name {
            self.attributes.remove(PRODUCT_NAME);
            self.product_name = product_name;
        }
        if let Some(product_description) = patch.product_description {
            self.attributes.remove(PRODUCT_DESCRIPTION);
            self.product_description = product_description;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(image_path) = patch.image_path {
            self.attributes.remove(IMAGE_PATH);
            self.image_path = image_path;
        }
        self.attributes.extend(patch.attributes);
    }
}

impl Serialize for Product {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text_fields = [
            (PRODUCT_ID, self.product_id.as_str()),
            (PRODUCT_NAME, self.product_name.as_str()),
            (PRODUCT_DESCRIPTION, self.product_description.as_str()),
            (IMAGE_PATH, self.image_path.as_str()),
        ];

        let mut map = serializer.serialize_map(None)?;
        for (key, value) in text_fields {
            if !self.attributes.contains_key(key) {
                map.serialize_entry(key, value)?;
            }
        }
        map.serialize_entry(IS_ACTIVE, &self.is_active)?;
        for (key, value) in &self.attributes {
            if key != IS_ACTIVE {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Product {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut attributes = Map::<String, Value>::deserialize(deserializer)?;

        let is_active = attributes.remove(IS_ACTIVE).map(ActiveFlag::from).unwrap_or_default();
        let product_id = ProductId(take_text(&mut attributes, PRODUCT_ID));
        let product_name = take_text(&mut attributes, PRODUCT_NAME);
        let product_description = take_text(&mut attributes, PRODUCT_DESCRIPTION);
        let image_path = take_text(&mut attributes, IMAGE_PATH);

        Ok(Self {
            product_id,
            product_name,
            product_description,
            is_active,
            image_path,
            attributes,
        })
    }
}

/// Moves a string value out of `attributes`; anything else stays there.
fn take_text(attributes: &mut Map<String, Value>, key: &str) -> String {
    match attributes.remove(key) {
        Some(Value::String(text)) => text,
        Some(other) => {
            attributes.insert(key.to_string(), other);
            String::new()
        }
        None => String::new(),
    }
}

/// Caller-supplied fields for a new product. The image reference is passed
/// separately because it is computed by the upload layer.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_description: String,
    #[serde(default)]
    pub is_active: ActiveFlag,
}

impl NewProduct {
    pub fn into_product(self, image_path: Option<String>) -> Product {
        Product {
            product_id: self.product_id,
            product_name: self.product_name,
            product_description: self.product_description,
            is_active: self.is_active,
            image_path: image_path.unwrap_or_default(),
            attributes: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    /// `Some` whenever the key is present, including an explicit `null`.
    #[serde(default, deserialize_with = "present_flag")]
    pub is_active: Option<ActiveFlag>,
    pub image_path: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.product_id.is_none()
            && self.product_name.is_none()
            && self.product_description.is_none()
            && self.is_active.is_none()
            && self.image_path.is_none()
            && self.attributes.is_empty()
    }
}

fn present_flag<'de, D>(deserializer: D) -> Result<Option<ActiveFlag>, D::Error>
where
    D: Deserializer<'de>,
{
    ActiveFlag::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{ActiveFlag, NewProduct, Product, ProductId, ProductPatch};

    fn sample() -> Product {
        NewProduct {
            product_id: ProductId::from("p-1"),
            product_name: "A".to_string(),
            product_description: "first".to_string(),
            is_active: true.into(),
        }
        .into_product(None)
    }

    #[test]
    fn only_boolean_true_counts_as_active() {
        assert!(ActiveFlag::from(true).is_true());
        assert!(!ActiveFlag::from(false).is_true());
        assert!(!ActiveFlag::from(json!("true")).is_true());
        assert!(!ActiveFlag::from(json!(1)).is_true());
        assert!(!ActiveFlag::default().is_true());
    }

    #[test]
    fn new_product_without_image_stores_empty_path() {
        let product = sample();
        assert_eq!(product.image_path, "");
        assert!(!product.has_image());
    }

    #[test]
    fn merge_overwrites_only_present_fields() {
        let mut product = sample();
        product.merge(ProductPatch {
            product_name: Some("B".to_string()),
            ..ProductPatch::default()
        });

        assert_eq!(product.product_name, "B");
        assert_eq!(product.product_description, "first");
        assert!(product.is_active.is_true());
        assert_eq!(product.product_id, ProductId::from("p-1"));
    }

    #[test]
    fn patch_deserializes_camel_case_and_keeps_unknown_keys() {
        let patch: ProductPatch =
            serde_json::from_value(json!({ "isActive": "yes", "color": "red" }))
                .expect("patch should deserialize");

        assert_eq!(patch.is_active, Some(ActiveFlag::from(json!("yes"))));
        assert_eq!(patch.attributes.get("color"), Some(&Value::from("red")));
        assert!(patch.product_name.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn explicit_null_flag_in_patch_is_present() {
        let patch: ProductPatch =
            serde_json::from_value(json!({ "isActive": null })).expect("patch should deserialize");

        assert_eq!(patch.is_active, Some(ActiveFlag::from(Value::Null)));
        assert!(!patch.is_empty());

        let mut product = sample();
        product.merge(patch);
        assert_eq!(product.is_active.as_value(), &Value::Null);
        assert!(!product.is_active.is_true());
    }

    #[test]
    fn non_string_text_fields_are_kept_verbatim() {
        let raw = json!({
            "productId": 7,
            "productName": null,
            "productDescription": { "long": "text" },
            "isActive": true,
            "imagePath": false
        });

        let product: Product = serde_json::from_value(raw.clone()).expect("loose record");

        assert_eq!(product.product_id, ProductId::default());
        assert_eq!(product.product_name, "");
        assert!(!product.has_image());
        assert!(!product.matches(&ProductId::default()));
        assert!(!product.matches(&ProductId::from("7")));
        assert_eq!(serde_json::to_value(&product).expect("serialize"), raw);
    }

    #[test]
    fn missing_id_reads_as_empty_id() {
        let product: Product =
            serde_json::from_value(json!({ "productName": "x" })).expect("record without id");

        assert_eq!(product.product_id, ProductId::default());
        assert!(product.is_active.as_value().is_null());
        assert!(product.attributes.is_empty());
    }

    #[test]
    fn patching_a_raw_field_replaces_the_stored_value() {
        let mut product: Product =
            serde_json::from_value(json!({ "productId": 7, "productName": null }))
                .expect("loose record");

        product.merge(ProductPatch {
            product_id: Some(ProductId::from("p-7")),
            product_name: Some("named".to_string()),
            ..ProductPatch::default()
        });

        assert!(product.matches(&ProductId::from("p-7")));
        let value = serde_json::to_value(&product).expect("serialize");
        assert_eq!(value["productId"], "p-7");
        assert_eq!(value["productName"], "named");
    }

    #[test]
    fn product_serializes_with_wire_keys() {
        let value = serde_json::to_value(sample()).expect("serialize product");
        assert_eq!(
            value,
            json!({
                "productId": "p-1",
                "productName": "A",
                "productDescription": "first",
                "isActive": true,
                "imagePath": ""
            })
        );
    }
}
