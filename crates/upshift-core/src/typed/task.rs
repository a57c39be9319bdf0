//! Operation trait - 型付き callback の定義
//!
//! # 学習ポイント
//! - Associated Constants (`const CALLBACK`)
//! - 引数配列をそのまま型に decode する（positional decoding）

use serde::de::DeserializeOwned;

use crate::domain::Callback;

/// Operation ties an operation id to the type its arguments decode into.
///
/// The stored argument list is decoded as one JSON array, so fields are
/// matched by position:
///
/// ```ignore
/// #[derive(Deserialize)]
/// struct AddColumn {
///     table: String,
///     column: String,
/// }
///
/// impl Operation for AddColumn {
///     const CALLBACK: &'static str = "Schema::addColumn";
/// }
/// // arguments ["civicrm_contact", "nick_name"] -> AddColumn { .. }
/// ```
///
/// Zero-argument operations use an empty braced struct (`struct Finish {}`):
/// it decodes from `[]`, a unit struct would not.
pub trait Operation: DeserializeOwned + Send + Sync + 'static {
    /// `::`-joined callback path, e.g. `Schema::addColumn`.
    const CALLBACK: &'static str;

    fn callback() -> Callback {
        Callback::parse(Self::CALLBACK)
    }

    fn decode(args: &[serde_json::Value]) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Array(args.to_vec()))
    }
}
