//! # リクエストペイロードの形状チェック
//!
//! ルートごとに宣言された JSON の形状を、転送前に最低限だけ確認する。
//!
//! 確認は型付き構造体へのデシリアライズで行うが、転送するのは受け取った
//! バイト列そのもの。構造体は形状の宣言としてのみ使い、値は捨てる。
//! 質問の中身などの詳細な検証はバックエンドの責務。

use bytes::Bytes;
use serde::{Deserialize, de::DeserializeOwned};

/// ルートが期待するペイロードの形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PayloadShape {
    /// ボディを読まない（GET / DELETE）
    None,
    /// 任意の JSON オブジェクト
    AnyObject,
    /// 空ボディ、または任意の JSON オブジェクト（公開・複製などの操作系）
    OptionalObject,
    /// ログイン（`email`, `password`）
    Login,
    /// 管理者によるユーザー作成
    UserCreate,
    /// アンケート作成・更新
    SurveyCreate,
    /// テンプレート作成・更新
    TemplateCreate,
    /// 回答作成
    ResponseCreate,
    /// テーマ作成（`name`, `category`）
    ThemeCreate,
    /// ユーザー招待（`email`, `name`）
    Invite,
}

impl PayloadShape {
    /// ボディを受け取る形状か
    pub fn expects_body(self) -> bool {
        !matches!(self, PayloadShape::None)
    }

    /// 空ボディを許す形状か
    pub fn allows_empty(self) -> bool {
        matches!(self, PayloadShape::None | PayloadShape::OptionalObject)
    }

    /// 受信ボディを確認し、転送するバイト列を返す
    ///
    /// 戻り値が `None` の場合はボディなしで転送する。
    /// 確認に通ったボディは受け取ったバイト列のまま返す。
    pub fn accept(self, body: Bytes) -> Result<Option<Bytes>, String> {
        if !self.expects_body() {
            return Ok(None);
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return if self.allows_empty() {
                Ok(None)
            } else {
                Err("リクエストボディが必要です".to_string())
            };
        }

        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| format!("リクエストボディを JSON として解釈できません: {e}"))?;
        self.validate(&value)?;

        Ok(Some(body))
    }

    /// JSON 値が形状を満たすか確認する
    ///
    /// 失敗時はクライアントに返す説明文を返す。
    pub fn validate(self, value: &serde_json::Value) -> Result<(), String> {
        match self {
            PayloadShape::None => Ok(()),
            PayloadShape::AnyObject | PayloadShape::OptionalObject => {
                if value.is_object() {
                    Ok(())
                } else {
                    Err("JSON オブジェクトである必要があります".to_string())
                }
            }
            PayloadShape::Login => check::<LoginPayload>(value),
            PayloadShape::UserCreate => check::<UserCreatePayload>(value),
            PayloadShape::SurveyCreate => check::<SurveyPayload>(value),
            PayloadShape::TemplateCreate => check::<TemplatePayload>(value),
            PayloadShape::ResponseCreate => check::<ResponseCreatePayload>(value),
            PayloadShape::ThemeCreate => check::<ThemePayload>(value),
            PayloadShape::Invite => check::<InvitePayload>(value),
        }
    }
}

fn check<T: DeserializeOwned>(value: &serde_json::Value) -> Result<(), String> {
    T::deserialize(value)
        .map(drop)
        .map_err(|e| format!("リクエストボディの形式が不正です: {e}"))
}

// --- 形状の宣言 ---
//
// フィールドは読まれない。デシリアライズが通るかどうかだけを見る。

type QuestionList = Vec<serde_json::Map<String, serde_json::Value>>;

#[derive(Deserialize)]
#[allow(dead_code)]
struct LoginPayload {
    email:    String,
    password: String,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct UserCreatePayload {
    email:     String,
    password:  String,
    full_name: String,
    #[serde(default)]
    role:      Option<String>,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct SurveyPayload {
    title:       String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_public:   bool,
    #[serde(default)]
    questions:   QuestionList,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct TemplatePayload {
    title:       String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category:    Option<String>,
    #[serde(default)]
    is_public:   bool,
    #[serde(default)]
    questions:   QuestionList,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct ResponseCreatePayload {
    survey_id:     i64,
    question_id:   i64,
    response_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct ThemePayload {
    name:     String,
    category: String,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct InvitePayload {
    email:   String,
    name:    String,
    #[serde(default)]
    role:    Option<String>,
    #[serde(default)]
    message: Option<String>,
}
