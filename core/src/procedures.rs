//! Typed wrappers, one per remote procedure.
//!
//! Every wrapper authenticates implicitly, sends all positional slots (absent
//! optionals become explicit `null`), and returns the raw result. Nothing is
//! reinterpreted here; see [`decode_string_list`] for the one decoding helper
//! callers may apply explicitly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::rpc::Param;
use crate::transport::Transport;

/// Wire names of the remote procedures.
pub mod procedure {
    pub const AUTHENTICATE: &str = "authenticate";
    pub const RELEASE_TOKEN: &str = "release_token";

    pub const LIST_SURVEYS: &str = "list_surveys";
    pub const GET_SURVEY_PROPERTIES: &str = "get_survey_properties";
    pub const SET_SURVEY_PROPERTIES: &str = "set_survey_properties";
    pub const ACTIVATE_SURVEY: &str = "activate_survey";
    pub const GET_SUMMARY: &str = "get_summary";
    pub const COPY_SURVEY: &str = "copy_survey";
    pub const DELETE_SURVEY: &str = "delete_survey";
    pub const EXPORT_SURVEY_STRUCTURE: &str = "export_survey_structure";
    pub const IMPORT_SURVEY: &str = "import_survey";

    pub const LIST_GROUPS: &str = "list_groups";
    pub const LIST_QUESTIONS: &str = "list_questions";
    pub const GET_QUESTION_PROPERTIES: &str = "get_question_properties";

    pub const ACTIVATE_TOKENS: &str = "activate_tokens";
    pub const LIST_PARTICIPANTS: &str = "list_participants";
    pub const GET_PARTICIPANT_PROPERTIES: &str = "get_participant_properties";
    pub const ADD_PARTICIPANTS: &str = "add_participants";
    pub const SET_PARTICIPANT_PROPERTIES: &str = "set_participant_properties";
    pub const DELETE_PARTICIPANTS: &str = "delete_participants";
    pub const INVITE_PARTICIPANTS: &str = "invite_participants";
    pub const REMIND_PARTICIPANTS: &str = "remind_participants";

    pub const GET_RESPONSE_IDS: &str = "get_response_ids";
    pub const EXPORT_RESPONSES: &str = "export_responses";
    pub const EXPORT_RESPONSES_BY_TOKEN: &str = "export_responses_by_token";
    pub const ADD_RESPONSE: &str = "add_response";
    pub const UPDATE_RESPONSE: &str = "update_response";
    pub const DELETE_RESPONSE: &str = "delete_response";
    pub const DELETE_ALL_RESPONSES: &str = "delete_all_responses";
    pub const RESET_RESPONSES: &str = "reset_responses";

    pub const EXPORT_STATISTICS: &str = "export_statistics";
    pub const EXPORT_TIMELINE: &str = "export_timeline";

    pub const UPLOAD_FILE: &str = "upload_file";
    pub const GET_UPLOADED_FILES: &str = "get_uploaded_files";

    pub const LIST_QUOTAS: &str = "list_quotas";
    pub const GET_QUOTA_PROPERTIES: &str = "get_quota_properties";

    pub const LIST_USERS: &str = "list_users";
    pub const GET_SITE_SETTINGS: &str = "get_site_settings";
    pub const GET_LANGUAGE_PROPERTIES: &str = "get_language_properties";
    pub const GET_FIELDMAP: &str = "get_fieldmap";
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Case-insensitive parse of the wire name.
            pub fn parse(raw: &str) -> Option<Self> {
                let raw = raw.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(raw))
            }

            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl From<$name> for Param {
            fn from(value: $name) -> Self {
                Param::Text(value.as_str().to_string())
            }
        }
    };
}

wire_enum!(
    /// Document format for response exports.
    ResponseFormat {
        Csv => "csv",
        Json => "json",
        Xls => "xls",
        Pdf => "pdf",
        Doc => "doc",
        Html => "html",
        Txt => "txt",
    }
);

wire_enum!(
    StatisticsFormat {
        Pdf => "pdf",
        Xls => "xls",
        Html => "html",
    }
);

wire_enum!(
    CompletionStatus {
        Complete => "complete",
        Incomplete => "incomplete",
        All => "all",
    }
);

wire_enum!(
    /// How question columns are labelled in exports.
    HeadingType {
        Code => "code",
        Full => "full",
        Abbreviated => "abbreviated",
    }
);

wire_enum!(
    ResponseType {
        Short => "short",
        Long => "long",
    }
);

wire_enum!(
    TimelinePeriod {
        Day => "day",
        Hour => "hour",
    }
);

wire_enum!(
    SurveyImportFormat {
        Lss => "lss",
        Lsa => "lsa",
        Tsv => "tsv",
        Txt => "txt",
    }
);

impl ResponseFormat {
    /// Text formats can be decoded for a preview; the rest stay base64.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            ResponseFormat::Csv | ResponseFormat::Json | ResponseFormat::Html | ResponseFormat::Txt
        )
    }
}

impl StatisticsFormat {
    pub fn is_text(self) -> bool {
        matches!(self, StatisticsFormat::Html)
    }
}

/// Shared knobs of `export_responses` and `export_responses_by_token`.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub format: ResponseFormat,
    pub language: Option<String>,
    pub completion: CompletionStatus,
    pub heading: HeadingType,
    pub response_type: ResponseType,
    pub fields: Option<Vec<String>>,
}

impl ExportOptions {
    pub fn new(format: ResponseFormat) -> Self {
        Self {
            format,
            language: None,
            completion: CompletionStatus::All,
            heading: HeadingType::Code,
            response_type: ResponseType::Short,
            fields: None,
        }
    }
}

/// Window for `list_participants`.
#[derive(Debug, Clone, Default)]
pub struct ParticipantQuery {
    pub start: i64,
    pub limit: i64,
    pub unused_only: bool,
    pub attributes: Option<Vec<String>>,
    pub conditions: Option<Map<String, Value>>,
}

/// Some settings come back as a JSON-encoded string array, e.g.
/// `"[\"en\",\"de\"]"`. Returns `None` when `value` is not such a string.
pub fn decode_string_list(value: &Value) -> Option<Vec<String>> {
    let raw = value.as_str()?;
    serde_json::from_str::<Vec<String>>(raw).ok()
}

impl<T: Transport> Gateway<T> {
    // -- surveys --

    pub async fn list_surveys(&self, owner: Option<&str>) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::LIST_SURVEYS, vec![Param::optional(owner)])
            .await
    }

    pub async fn get_survey_properties(
        &self,
        survey_id: i64,
        settings: Option<Vec<String>>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::GET_SURVEY_PROPERTIES,
            vec![survey_id.into(), Param::optional(settings)],
        )
        .await
    }

    pub async fn set_survey_properties(
        &self,
        survey_id: i64,
        data: Map<String, Value>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::SET_SURVEY_PROPERTIES,
            vec![survey_id.into(), data.into()],
        )
        .await
    }

    pub async fn activate_survey(&self, survey_id: i64) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::ACTIVATE_SURVEY, vec![survey_id.into()])
            .await
    }

    pub async fn get_summary(
        &self,
        survey_id: i64,
        stat: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::GET_SUMMARY,
            vec![survey_id.into(), stat.unwrap_or("all").into()],
        )
        .await
    }

    pub async fn copy_survey(&self, survey_id: i64, new_name: &str) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::COPY_SURVEY,
            vec![survey_id.into(), new_name.into()],
        )
        .await
    }

    pub async fn delete_survey(&self, survey_id: i64) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::DELETE_SURVEY, vec![survey_id.into()])
            .await
    }

    /// Base64 `.lss` document describing the survey.
    pub async fn export_survey_structure(&self, survey_id: i64) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::EXPORT_SURVEY_STRUCTURE, vec![survey_id.into()])
            .await
    }

    pub async fn import_survey_structure(
        &self,
        data_base64: &str,
        format: SurveyImportFormat,
        new_name: Option<&str>,
        new_id: Option<i64>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::IMPORT_SURVEY,
            vec![
                data_base64.into(),
                format.into(),
                Param::optional(new_name),
                Param::optional(new_id),
            ],
        )
        .await
    }

    // -- groups and questions --

    pub async fn list_groups(&self, survey_id: i64) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::LIST_GROUPS, vec![survey_id.into()])
            .await
    }

    pub async fn list_questions(
        &self,
        survey_id: i64,
        group_id: Option<i64>,
        language: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::LIST_QUESTIONS,
            vec![
                survey_id.into(),
                Param::optional(group_id),
                Param::optional(language),
            ],
        )
        .await
    }

    pub async fn get_question_properties(
        &self,
        question_id: i64,
        settings: Option<Vec<String>>,
        language: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::GET_QUESTION_PROPERTIES,
            vec![
                question_id.into(),
                Param::optional(settings),
                Param::optional(language),
            ],
        )
        .await
    }

    // -- participants --

    /// Create the participant table, optionally with extra attribute fields.
    pub async fn activate_participants(
        &self,
        survey_id: i64,
        attribute_fields: Option<Vec<i64>>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::ACTIVATE_TOKENS,
            vec![survey_id.into(), Param::optional(attribute_fields)],
        )
        .await
    }

    pub async fn list_participants(
        &self,
        survey_id: i64,
        query: ParticipantQuery,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::LIST_PARTICIPANTS,
            vec![
                survey_id.into(),
                query.start.into(),
                query.limit.into(),
                query.unused_only.into(),
                Param::optional(query.attributes),
                Param::optional(query.conditions),
            ],
        )
        .await
    }

    pub async fn get_participant_properties(
        &self,
        survey_id: i64,
        query: Map<String, Value>,
        properties: Option<Vec<String>>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::GET_PARTICIPANT_PROPERTIES,
            vec![survey_id.into(), query.into(), Param::optional(properties)],
        )
        .await
    }

    pub async fn add_participants(
        &self,
        survey_id: i64,
        participants: Vec<Map<String, Value>>,
        create_tokens: bool,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::ADD_PARTICIPANTS,
            vec![survey_id.into(), participants.into(), create_tokens.into()],
        )
        .await
    }

    pub async fn set_participant_properties(
        &self,
        survey_id: i64,
        query: Map<String, Value>,
        data: Map<String, Value>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::SET_PARTICIPANT_PROPERTIES,
            vec![survey_id.into(), query.into(), data.into()],
        )
        .await
    }

    pub async fn delete_participants(
        &self,
        survey_id: i64,
        participant_ids: Vec<i64>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::DELETE_PARTICIPANTS,
            vec![survey_id.into(), participant_ids.into()],
        )
        .await
    }

    pub async fn invite_participants(
        &self,
        survey_id: i64,
        participant_ids: Option<Vec<i64>>,
        email_all: bool,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::INVITE_PARTICIPANTS,
            vec![
                survey_id.into(),
                Param::optional(participant_ids),
                email_all.into(),
            ],
        )
        .await
    }

    pub async fn remind_participants(
        &self,
        survey_id: i64,
        min_days_between: Option<i64>,
        max_reminders: Option<i64>,
        participant_ids: Option<Vec<i64>>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::REMIND_PARTICIPANTS,
            vec![
                survey_id.into(),
                Param::optional(min_days_between),
                Param::optional(max_reminders),
                Param::optional(participant_ids),
            ],
        )
        .await
    }

    // -- responses --

    pub async fn list_responses(
        &self,
        survey_id: i64,
        token: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::GET_RESPONSE_IDS,
            vec![survey_id.into(), Param::optional(token)],
        )
        .await
    }

    /// Base64 document in `options.format`.
    pub async fn export_responses(
        &self,
        survey_id: i64,
        options: ExportOptions,
        from_response_id: Option<i64>,
        to_response_id: Option<i64>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::EXPORT_RESPONSES,
            vec![
                survey_id.into(),
                options.format.into(),
                Param::optional(options.language),
                options.completion.into(),
                options.heading.into(),
                options.response_type.into(),
                Param::optional(from_response_id),
                Param::optional(to_response_id),
                Param::optional(options.fields),
            ],
        )
        .await
    }

    pub async fn export_responses_by_token(
        &self,
        survey_id: i64,
        token: &str,
        options: ExportOptions,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::EXPORT_RESPONSES_BY_TOKEN,
            vec![
                survey_id.into(),
                options.format.into(),
                token.into(),
                Param::optional(options.language),
                options.completion.into(),
                options.heading.into(),
                options.response_type.into(),
                Param::optional(options.fields),
            ],
        )
        .await
    }

    pub async fn import_response(
        &self,
        survey_id: i64,
        data: Map<String, Value>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::ADD_RESPONSE, vec![survey_id.into(), data.into()])
            .await
    }

    /// `data` must carry the response `id`.
    pub async fn update_response(
        &self,
        survey_id: i64,
        data: Map<String, Value>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::UPDATE_RESPONSE,
            vec![survey_id.into(), data.into()],
        )
        .await
    }

    pub async fn delete_response(
        &self,
        survey_id: i64,
        response_id: i64,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::DELETE_RESPONSE,
            vec![survey_id.into(), response_id.into()],
        )
        .await
    }

    pub async fn delete_all_responses(&self, survey_id: i64) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::DELETE_ALL_RESPONSES, vec![survey_id.into()])
            .await
    }

    /// Drop all responses and reset participant completion state.
    pub async fn reset_responses(&self, survey_id: i64) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::RESET_RESPONSES, vec![survey_id.into()])
            .await
    }

    // -- statistics --

    pub async fn export_statistics(
        &self,
        survey_id: i64,
        format: StatisticsFormat,
        language: Option<&str>,
        include_graphs: bool,
        group_ids: Option<Vec<i64>>,
    ) -> Result<Value, GatewayError> {
        let graphs = if include_graphs { "1" } else { "0" };
        self.call_with_session(
            procedure::EXPORT_STATISTICS,
            vec![
                survey_id.into(),
                format.into(),
                Param::optional(language),
                graphs.into(),
                Param::optional(group_ids),
            ],
        )
        .await
    }

    /// Dates are `YYYY-MM-DD`; validation is the caller's job.
    pub async fn export_timeline(
        &self,
        survey_id: i64,
        period: TimelinePeriod,
        start: &str,
        end: &str,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::EXPORT_TIMELINE,
            vec![survey_id.into(), period.into(), start.into(), end.into()],
        )
        .await
    }

    // -- files --

    pub async fn upload_file(
        &self,
        survey_id: i64,
        field_name: &str,
        file_name: &str,
        content_base64: &str,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::UPLOAD_FILE,
            vec![
                survey_id.into(),
                field_name.into(),
                file_name.into(),
                content_base64.into(),
            ],
        )
        .await
    }

    pub async fn list_uploaded_files(
        &self,
        survey_id: i64,
        token: Option<&str>,
        response_id: Option<i64>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::GET_UPLOADED_FILES,
            vec![
                survey_id.into(),
                Param::optional(token),
                Param::optional(response_id),
            ],
        )
        .await
    }

    // -- quotas, users, site --

    pub async fn list_quotas(&self, survey_id: i64) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::LIST_QUOTAS, vec![survey_id.into()])
            .await
    }

    pub async fn get_quota_properties(
        &self,
        quota_id: i64,
        settings: Option<Vec<String>>,
        language: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::GET_QUOTA_PROPERTIES,
            vec![
                quota_id.into(),
                Param::optional(settings),
                Param::optional(language),
            ],
        )
        .await
    }

    pub async fn list_users(&self, user_id: Option<i64>) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::LIST_USERS, vec![Param::optional(user_id)])
            .await
    }

    pub async fn get_user_details(&self, user_id: i64) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::LIST_USERS, vec![user_id.into()])
            .await
    }

    pub async fn get_site_settings(&self, setting_name: &str) -> Result<Value, GatewayError> {
        self.call_with_session(procedure::GET_SITE_SETTINGS, vec![setting_name.into()])
            .await
    }

    pub async fn get_language_properties(
        &self,
        survey_id: i64,
        settings: Option<Vec<String>>,
        language: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::GET_LANGUAGE_PROPERTIES,
            vec![
                survey_id.into(),
                Param::optional(settings),
                Param::optional(language),
            ],
        )
        .await
    }

    pub async fn get_fieldmap(
        &self,
        survey_id: i64,
        language: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.call_with_session(
            procedure::GET_FIELDMAP,
            vec![survey_id.into(), Param::optional(language)],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::Credentials;
    use crate::rpc::RemoteFault;
    use crate::testing::{FakeTransport, Reply};

    fn gateway(transport: FakeTransport) -> Gateway<FakeTransport> {
        Gateway::with_transport(transport, Credentials::new("u", "p"))
    }

    fn wire_params(gw: &Gateway<FakeTransport>, method: &str) -> Value {
        let request = gw.transport().last(method).expect("procedure was called");
        serde_json::to_value(&request.params).unwrap()
    }

    #[tokio::test]
    async fn list_surveys_sends_token_and_null_owner() {
        let transport = FakeTransport::new().reply(
            "list_surveys",
            Reply::result(json!([{"sid": 123456, "surveyls_title": "Intake"}])),
        );
        let gw = gateway(transport);

        let result = gw.list_surveys(None).await.unwrap();

        assert_eq!(result[0]["sid"], 123456);
        assert_eq!(wire_params(&gw, "list_surveys"), json!(["SESSIONKEY123", null]));
    }

    #[tokio::test]
    async fn list_surveys_surfaces_remote_error_payload() {
        let transport =
            FakeTransport::new().reply("list_surveys", Reply::error(json!("Invalid session key")));
        let gw = gateway(transport);

        let err = gw.list_surveys(None).await.unwrap_err();
        assert_eq!(
            err.remote_fault(),
            Some(&RemoteFault::Message("Invalid session key".to_string()))
        );
    }

    #[tokio::test]
    async fn export_responses_keeps_every_positional_slot() {
        let gw = gateway(FakeTransport::new());
        let mut options = ExportOptions::new(ResponseFormat::Csv);
        options.completion = CompletionStatus::Complete;
        options.heading = HeadingType::Full;
        options.fields = Some(vec!["id".to_string(), "q1".to_string()]);

        gw.export_responses(42, options, Some(10), None).await.unwrap();

        assert_eq!(
            wire_params(&gw, "export_responses"),
            json!([
                "SESSIONKEY123",
                42,
                "csv",
                null,
                "complete",
                "full",
                "short",
                10,
                null,
                ["id", "q1"]
            ])
        );
    }

    #[tokio::test]
    async fn export_responses_by_token_orders_token_after_format() {
        let gw = gateway(FakeTransport::new());
        gw.export_responses_by_token(42, "abc", ExportOptions::new(ResponseFormat::Json))
            .await
            .unwrap();

        assert_eq!(
            wire_params(&gw, "export_responses_by_token"),
            json!(["SESSIONKEY123", 42, "json", "abc", null, "all", "code", "short", null])
        );
    }

    #[tokio::test]
    async fn statistics_graph_flag_is_sent_as_string() {
        let gw = gateway(FakeTransport::new());
        gw.export_statistics(7, StatisticsFormat::Pdf, Some("de"), true, Some(vec![3]))
            .await
            .unwrap();

        assert_eq!(
            wire_params(&gw, "export_statistics"),
            json!(["SESSIONKEY123", 7, "pdf", "de", "1", [3]])
        );
    }

    #[tokio::test]
    async fn add_participants_sends_records_and_flag() {
        let gw = gateway(FakeTransport::new());
        let mut row = Map::new();
        row.insert("email".to_string(), json!("a@example.org"));
        row.insert("firstname".to_string(), json!("Ada"));

        gw.add_participants(9, vec![row], false).await.unwrap();

        assert_eq!(
            wire_params(&gw, "add_participants"),
            json!([
                "SESSIONKEY123",
                9,
                [{"email": "a@example.org", "firstname": "Ada"}],
                false
            ])
        );
    }

    #[tokio::test]
    async fn get_user_details_and_list_users_share_a_procedure() {
        let gw = gateway(FakeTransport::new());
        gw.list_users(None).await.unwrap();
        assert_eq!(wire_params(&gw, "list_users"), json!(["SESSIONKEY123", null]));

        gw.get_user_details(5).await.unwrap();
        assert_eq!(wire_params(&gw, "list_users"), json!(["SESSIONKEY123", 5]));
        assert_eq!(gw.transport().calls("authenticate"), 1);
    }

    #[tokio::test]
    async fn summary_defaults_to_all_stats() {
        let gw = gateway(FakeTransport::new());
        gw.get_summary(11, None).await.unwrap();
        assert_eq!(wire_params(&gw, "get_summary"), json!(["SESSIONKEY123", 11, "all"]));
    }

    #[tokio::test]
    async fn authentication_failure_stops_convenience_call() {
        let transport =
            FakeTransport::new().reply("authenticate", Reply::error(json!("Invalid user name")));
        let gw = gateway(transport);

        let err = gw.list_groups(1).await.unwrap_err();
        assert!(matches!(err, GatewayError::RemoteProcedure { .. }));
        assert_eq!(gw.transport().calls("list_groups"), 0);
    }

    #[test]
    fn wire_enums_parse_case_insensitively() {
        assert_eq!(ResponseFormat::parse("CSV"), Some(ResponseFormat::Csv));
        assert_eq!(ResponseFormat::parse("Txt"), Some(ResponseFormat::Txt));
        assert_eq!(ResponseFormat::parse("rtf"), None);
        assert!(ResponseFormat::Json.is_text());
        assert!(ResponseFormat::Txt.is_text());
        assert!(!ResponseFormat::Pdf.is_text());
        assert_eq!(HeadingType::names(), vec!["code", "full", "abbreviated"]);
        assert_eq!(
            serde_json::to_value(CompletionStatus::Incomplete).unwrap(),
            json!("incomplete")
        );
    }

    #[test]
    fn decode_string_list_only_accepts_encoded_arrays() {
        assert_eq!(
            decode_string_list(&json!("[\"en\",\"de\"]")),
            Some(vec!["en".to_string(), "de".to_string()])
        );
        assert_eq!(decode_string_list(&json!("en")), None);
        assert_eq!(decode_string_list(&json!(["en"])), None);
    }
}
