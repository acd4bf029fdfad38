//! Tool catalog and the adapters behind `tools/call`.
//!
//! One tool per gateway convenience method. Adapters validate arguments,
//! make exactly one gateway call, and format the raw result; they never
//! retry or reinterpret what the platform returned.

use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use serde_json::{Map, Value, json};
use survey_bridge_core::{
    CompletionStatus, ExportOptions, Gateway, HeadingType, ParticipantQuery, ResponseFormat,
    ResponseType, StatisticsFormat, SurveyImportFormat, TimelinePeriod, Transport,
    decode_string_list,
};

use crate::args::{
    ToolError, arg_bool, arg_enum, arg_i64, arg_optional_i64, arg_optional_i64_array,
    arg_optional_object, arg_optional_string, arg_optional_string_array, required_i64,
    required_i64_array, required_object, required_object_array, required_string,
};
use crate::format::{ToolOutput, export_preview, summarize};
use crate::to_pretty_json;

const DEFAULT_PARTICIPANT_LIMIT: i64 = 10;
const TIMELINE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
    /// Destroys data; requires `confirm: true`.
    Irreversible,
}

impl Access {
    pub(crate) fn is_mutating(self) -> bool {
        !matches!(self, Access::Read)
    }
}

#[derive(Debug)]
pub(crate) struct ToolDefinition {
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
    pub(crate) input_schema: Value,
    pub(crate) access: Access,
}

impl ToolDefinition {
    fn new(
        name: &'static str,
        description: &'static str,
        access: Access,
        properties: Value,
        required: &[&str],
    ) -> Self {
        let mut properties = match properties {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut required: Vec<&str> = required.to_vec();
        if access == Access::Irreversible {
            properties.insert(
                "confirm".to_string(),
                json!({
                    "type": "boolean",
                    "description": "Must be true. This operation cannot be undone."
                }),
            );
            required.push("confirm");
        }
        Self {
            name,
            description,
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false
            }),
            access,
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
        })
    }
}

fn int(description: &str) -> Value {
    json!({ "type": "integer", "description": description })
}

fn text(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn flag(description: &str, default: bool) -> Value {
    json!({ "type": "boolean", "description": description, "default": default })
}

fn text_list(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

fn int_list(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "integer" }, "description": description })
}

fn record(description: &str) -> Value {
    json!({ "type": "object", "description": description })
}

fn choice(names: Vec<&'static str>, default: &str) -> Value {
    json!({ "type": "string", "enum": names, "default": default })
}

fn survey_id() -> Value {
    int("Numeric survey ID")
}

fn language() -> Value {
    text("Language code, e.g. 'en'")
}

fn settings() -> Value {
    text_list("Property names to return; omit for all")
}

fn export_properties() -> Map<String, Value> {
    let mut props = Map::new();
    props.insert("survey_id".into(), survey_id());
    props.insert(
        "format".into(),
        choice(ResponseFormat::names(), ResponseFormat::Csv.as_str()),
    );
    props.insert("language".into(), language());
    props.insert(
        "completion_status".into(),
        choice(CompletionStatus::names(), CompletionStatus::All.as_str()),
    );
    props.insert(
        "heading_type".into(),
        choice(HeadingType::names(), HeadingType::Code.as_str()),
    );
    props.insert(
        "response_type".into(),
        choice(ResponseType::names(), ResponseType::Short.as_str()),
    );
    props.insert("fields".into(), text_list("Columns to export; omit for all"));
    props
}

static TOOLS: LazyLock<Vec<ToolDefinition>> = LazyLock::new(build_catalog);

pub(crate) fn tool_definitions() -> &'static [ToolDefinition] {
    &TOOLS
}

pub(crate) fn find_tool(name: &str) -> Option<&'static ToolDefinition> {
    TOOLS.iter().find(|tool| tool.name == name)
}

fn build_catalog() -> Vec<ToolDefinition> {
    use Access::{Irreversible, Read, Write};

    let mut export_by_token = export_properties();
    export_by_token.insert("token".into(), text("Participant access token"));
    let mut export_range = export_properties();
    export_range.insert("from_response_id".into(), int("First response ID to include"));
    export_range.insert("to_response_id".into(), int("Last response ID to include"));

    vec![
        // surveys
        ToolDefinition::new(
            "list_surveys",
            "List surveys visible to the configured user, optionally for one owner.",
            Read,
            json!({ "owner": text("Username of the survey owner") }),
            &[],
        ),
        ToolDefinition::new(
            "get_survey_properties",
            "Read survey settings.",
            Read,
            json!({ "survey_id": survey_id(), "settings": settings() }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "set_survey_properties",
            "Update survey settings. Returns per-property results.",
            Write,
            json!({ "survey_id": survey_id(), "data": record("Property name to new value") }),
            &["survey_id", "data"],
        ),
        ToolDefinition::new(
            "activate_survey",
            "Activate a survey so it accepts responses.",
            Write,
            json!({ "survey_id": survey_id() }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "get_summary",
            "Response and participant counters for a survey.",
            Read,
            json!({
                "survey_id": survey_id(),
                "stat": text("Single counter name; omit for all")
            }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "copy_survey",
            "Copy a survey under a new name.",
            Write,
            json!({ "survey_id": survey_id(), "new_name": text("Title of the copy") }),
            &["survey_id", "new_name"],
        ),
        ToolDefinition::new(
            "delete_survey",
            "Permanently delete a survey with all of its responses.",
            Irreversible,
            json!({ "survey_id": survey_id() }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "export_survey_structure",
            "Export the survey structure document (.lss) with a text preview.",
            Read,
            json!({ "survey_id": survey_id() }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "import_survey_structure",
            "Create a survey from a base64 encoded structure document.",
            Write,
            json!({
                "data_base64": text("Base64 encoded survey document"),
                "format": choice(SurveyImportFormat::names(), SurveyImportFormat::Lss.as_str()),
                "new_name": text("Title override"),
                "new_id": int("Requested survey ID")
            }),
            &["data_base64"],
        ),
        // groups and questions
        ToolDefinition::new(
            "list_groups",
            "List question groups of a survey.",
            Read,
            json!({ "survey_id": survey_id() }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "list_questions",
            "List questions of a survey, optionally limited to one group.",
            Read,
            json!({
                "survey_id": survey_id(),
                "group_id": int("Question group ID"),
                "language": language()
            }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "get_question_properties",
            "Read question settings, answers and subquestions.",
            Read,
            json!({
                "question_id": int("Numeric question ID"),
                "settings": settings(),
                "language": language()
            }),
            &["question_id"],
        ),
        // participants
        ToolDefinition::new(
            "activate_participants",
            "Create the participant table of a survey.",
            Write,
            json!({
                "survey_id": survey_id(),
                "attribute_fields": int_list("IDs of extra participant attribute fields to create")
            }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "list_participants",
            "Page through the participants of a survey.",
            Read,
            json!({
                "survey_id": survey_id(),
                "start": { "type": "integer", "default": 0 },
                "limit": { "type": "integer", "default": DEFAULT_PARTICIPANT_LIMIT },
                "unused_only": flag("Only participants that have not used their token", false),
                "attributes": text_list("Extra attributes to include"),
                "conditions": record("Attribute name to required value")
            }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "get_participant_properties",
            "Read one participant, selected by ID or attribute match.",
            Read,
            json!({
                "survey_id": survey_id(),
                "query": record("e.g. {\"tid\": 5} or {\"email\": \"a@example.org\"}"),
                "properties": text_list("Properties to return; omit for all")
            }),
            &["survey_id", "query"],
        ),
        ToolDefinition::new(
            "add_participants",
            "Add participants to a survey.",
            Write,
            json!({
                "survey_id": survey_id(),
                "participants": {
                    "type": "array",
                    "items": { "type": "object" },
                    "description": "Participant records (email, firstname, lastname, attributes)"
                },
                "create_tokens": flag("Generate access tokens", true)
            }),
            &["survey_id", "participants"],
        ),
        ToolDefinition::new(
            "set_participant_properties",
            "Update one participant, selected by ID or attribute match.",
            Write,
            json!({
                "survey_id": survey_id(),
                "query": record("Participant selector"),
                "data": record("Property name to new value")
            }),
            &["survey_id", "query", "data"],
        ),
        ToolDefinition::new(
            "delete_participants",
            "Permanently delete participants.",
            Irreversible,
            json!({ "survey_id": survey_id(), "participant_ids": int_list("Participant IDs") }),
            &["survey_id", "participant_ids"],
        ),
        ToolDefinition::new(
            "invite_participants",
            "Send invitation emails.",
            Write,
            json!({
                "survey_id": survey_id(),
                "participant_ids": int_list("Limit to these participants"),
                "email_all": flag("Also email participants that were already invited", false)
            }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "remind_participants",
            "Send reminder emails to participants who have not responded.",
            Write,
            json!({
                "survey_id": survey_id(),
                "min_days_between": int("Minimum days since the last email"),
                "max_reminders": int("Skip participants with this many reminders"),
                "participant_ids": int_list("Limit to these participants")
            }),
            &["survey_id"],
        ),
        // responses
        ToolDefinition::new(
            "list_responses",
            "List response IDs, optionally for one participant token.",
            Read,
            json!({ "survey_id": survey_id(), "token": text("Participant access token") }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "export_responses",
            "Export responses. Text formats are previewed; binary formats report size.",
            Read,
            Value::Object(export_range),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "export_responses_by_token",
            "Export the responses of one participant token.",
            Read,
            Value::Object(export_by_token),
            &["survey_id", "token"],
        ),
        ToolDefinition::new(
            "import_response",
            "Insert a response record.",
            Write,
            json!({ "survey_id": survey_id(), "data": record("Field code to answer") }),
            &["survey_id", "data"],
        ),
        ToolDefinition::new(
            "update_response",
            "Update an existing response. `data` must include the response `id`.",
            Write,
            json!({ "survey_id": survey_id(), "data": record("Field code to answer, plus id") }),
            &["survey_id", "data"],
        ),
        ToolDefinition::new(
            "delete_response",
            "Permanently delete one response.",
            Irreversible,
            json!({ "survey_id": survey_id(), "response_id": int("Response ID") }),
            &["survey_id", "response_id"],
        ),
        ToolDefinition::new(
            "delete_all_responses",
            "Permanently delete every response of a survey.",
            Irreversible,
            json!({ "survey_id": survey_id() }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "reset_responses",
            "Delete all responses and reset participant completion state.",
            Irreversible,
            json!({ "survey_id": survey_id() }),
            &["survey_id"],
        ),
        // statistics
        ToolDefinition::new(
            "export_statistics",
            "Export response statistics. HTML is previewed; PDF and XLS report size.",
            Read,
            json!({
                "survey_id": survey_id(),
                "format": choice(StatisticsFormat::names(), StatisticsFormat::Pdf.as_str()),
                "language": language(),
                "include_graphs": flag("Render charts", false),
                "group_ids": int_list("Limit to these question groups")
            }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "export_timeline",
            "Response counts per day or hour between two dates.",
            Read,
            json!({
                "survey_id": survey_id(),
                "period": choice(TimelinePeriod::names(), TimelinePeriod::Day.as_str()),
                "start": text("Start date, YYYY-MM-DD"),
                "end": text("End date, YYYY-MM-DD")
            }),
            &["survey_id", "start", "end"],
        ),
        // files
        ToolDefinition::new(
            "upload_file",
            "Attach a file to a file-upload question.",
            Write,
            json!({
                "survey_id": survey_id(),
                "field_name": text("Field code of the upload question"),
                "file_name": text("File name including extension"),
                "content_base64": text("Base64 encoded file content")
            }),
            &["survey_id", "field_name", "file_name", "content_base64"],
        ),
        ToolDefinition::new(
            "list_uploaded_files",
            "List uploaded files of a survey, a token or a response.",
            Read,
            json!({
                "survey_id": survey_id(),
                "token": text("Participant access token"),
                "response_id": int("Response ID")
            }),
            &["survey_id"],
        ),
        // quotas, users, site
        ToolDefinition::new(
            "list_quotas",
            "List quotas of a survey.",
            Read,
            json!({ "survey_id": survey_id() }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "get_quota_properties",
            "Read quota settings.",
            Read,
            json!({
                "quota_id": int("Numeric quota ID"),
                "settings": settings(),
                "language": language()
            }),
            &["quota_id"],
        ),
        ToolDefinition::new(
            "list_users",
            "List administrative users.",
            Read,
            json!({ "user_id": int("Only this user") }),
            &[],
        ),
        ToolDefinition::new(
            "get_user_details",
            "Details of one administrative user.",
            Read,
            json!({ "user_id": int("Numeric user ID") }),
            &["user_id"],
        ),
        ToolDefinition::new(
            "get_site_settings",
            "Read one global setting. Encoded lists are decoded.",
            Read,
            json!({ "setting_name": text("e.g. 'defaultlang' or 'restrictToLanguages'") }),
            &["setting_name"],
        ),
        ToolDefinition::new(
            "get_language_properties",
            "Read language-specific survey settings.",
            Read,
            json!({
                "survey_id": survey_id(),
                "settings": settings(),
                "language": language()
            }),
            &["survey_id"],
        ),
        ToolDefinition::new(
            "get_fieldmap",
            "Column layout used by response exports.",
            Read,
            json!({ "survey_id": survey_id(), "language": language() }),
            &["survey_id"],
        ),
    ]
}

fn require_confirmation(tool: &ToolDefinition, args: &Map<String, Value>) -> Result<(), ToolError> {
    if tool.access != Access::Irreversible {
        return Ok(());
    }
    if arg_bool(args, "confirm", false)? {
        return Ok(());
    }
    Err(ToolError::new(
        "confirmation_required",
        format!(
            "'{}' cannot be undone. Call it again with confirm: true to proceed.",
            tool.name
        ),
    )
    .with_field("confirm"))
}

fn required_date(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    let raw = required_string(args, key)?;
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, TIMELINE_DATE_FORMAT).map_err(|_| {
        ToolError::validation(key, format!("'{key}' must be a date in YYYY-MM-DD format (got '{raw}')"))
    })?;
    Ok(trimmed.to_string())
}

fn required_base64(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    let raw = required_string(args, key)?;
    let trimmed = raw.trim();
    STANDARD
        .decode(trimmed)
        .map_err(|e| ToolError::validation(key, format!("'{key}' is not valid base64: {e}")))?;
    Ok(trimmed.to_string())
}

fn export_options(args: &Map<String, Value>) -> Result<ExportOptions, ToolError> {
    let format = arg_enum(
        args,
        "format",
        ResponseFormat::Csv,
        ResponseFormat::parse,
        &ResponseFormat::names(),
    )?;
    let mut options = ExportOptions::new(format);
    options.language = arg_optional_string(args, "language")?;
    options.completion = arg_enum(
        args,
        "completion_status",
        CompletionStatus::All,
        CompletionStatus::parse,
        &CompletionStatus::names(),
    )?;
    options.heading = arg_enum(
        args,
        "heading_type",
        HeadingType::Code,
        HeadingType::parse,
        &HeadingType::names(),
    )?;
    options.response_type = arg_enum(
        args,
        "response_type",
        ResponseType::Short,
        ResponseType::parse,
        &ResponseType::names(),
    )?;
    options.fields = arg_optional_string_array(args, "fields")?;
    Ok(options)
}

/// Runs the confirmation gate, then the adapter. Visibility (read-only
/// mode) is the caller's concern.
pub(crate) async fn call_tool<T: Transport>(
    gateway: &Gateway<T>,
    tool: &ToolDefinition,
    args: &Map<String, Value>,
) -> Result<ToolOutput, ToolError> {
    require_confirmation(tool, args)?;
    execute_tool(gateway, tool.name, args).await
}

async fn execute_tool<T: Transport>(
    gateway: &Gateway<T>,
    name: &str,
    args: &Map<String, Value>,
) -> Result<ToolOutput, ToolError> {
    let output = match name {
        "list_surveys" => {
            let owner = arg_optional_string(args, "owner")?;
            let result = gateway.list_surveys(owner.as_deref()).await?;
            summarize(count_summary("survey", &result), &result)
        }
        "get_survey_properties" => {
            let sid = required_i64(args, "survey_id")?;
            let settings = arg_optional_string_array(args, "settings")?;
            let result = gateway.get_survey_properties(sid, settings).await?;
            summarize(format!("Properties of survey {sid}"), &result)
        }
        "set_survey_properties" => {
            let sid = required_i64(args, "survey_id")?;
            let data = required_object(args, "data")?;
            let result = gateway.set_survey_properties(sid, data).await?;
            summarize(format!("Updated properties of survey {sid}"), &result)
        }
        "activate_survey" => {
            let sid = required_i64(args, "survey_id")?;
            let result = gateway.activate_survey(sid).await?;
            summarize(format!("Activated survey {sid}"), &result)
        }
        "get_summary" => {
            let sid = required_i64(args, "survey_id")?;
            let stat = arg_optional_string(args, "stat")?;
            let result = gateway.get_summary(sid, stat.as_deref()).await?;
            summarize(format!("Summary of survey {sid}"), &result)
        }
        "copy_survey" => {
            let sid = required_i64(args, "survey_id")?;
            let new_name = required_string(args, "new_name")?;
            let result = gateway.copy_survey(sid, &new_name).await?;
            summarize(format!("Copied survey {sid} as '{new_name}'"), &result)
        }
        "delete_survey" => {
            let sid = required_i64(args, "survey_id")?;
            let result = gateway.delete_survey(sid).await?;
            summarize(format!("Deleted survey {sid}"), &result)
        }
        "export_survey_structure" => {
            let sid = required_i64(args, "survey_id")?;
            let result = gateway.export_survey_structure(sid).await?;
            export_preview(format!("Exported structure of survey {sid} (lss)"), &result, true)
        }
        "import_survey_structure" => {
            let data = required_base64(args, "data_base64")?;
            let format = arg_enum(
                args,
                "format",
                SurveyImportFormat::Lss,
                SurveyImportFormat::parse,
                &SurveyImportFormat::names(),
            )?;
            let new_name = arg_optional_string(args, "new_name")?;
            let new_id = arg_optional_i64(args, "new_id")?;
            let result = gateway
                .import_survey_structure(&data, format, new_name.as_deref(), new_id)
                .await?;
            summarize(format!("Imported survey from {} document", format.as_str()), &result)
        }
        "list_groups" => {
            let sid = required_i64(args, "survey_id")?;
            let result = gateway.list_groups(sid).await?;
            summarize(count_summary("group", &result), &result)
        }
        "list_questions" => {
            let sid = required_i64(args, "survey_id")?;
            let gid = arg_optional_i64(args, "group_id")?;
            let language = arg_optional_string(args, "language")?;
            let result = gateway.list_questions(sid, gid, language.as_deref()).await?;
            summarize(count_summary("question", &result), &result)
        }
        "get_question_properties" => {
            let qid = required_i64(args, "question_id")?;
            let settings = arg_optional_string_array(args, "settings")?;
            let language = arg_optional_string(args, "language")?;
            let result = gateway
                .get_question_properties(qid, settings, language.as_deref())
                .await?;
            summarize(format!("Properties of question {qid}"), &result)
        }
        "activate_participants" => {
            let sid = required_i64(args, "survey_id")?;
            let fields = arg_optional_i64_array(args, "attribute_fields")?;
            let result = gateway.activate_participants(sid, fields).await?;
            summarize(format!("Activated participants for survey {sid}"), &result)
        }
        "list_participants" => {
            let sid = required_i64(args, "survey_id")?;
            let query = ParticipantQuery {
                start: arg_i64(args, "start", 0)?,
                limit: arg_i64(args, "limit", DEFAULT_PARTICIPANT_LIMIT)?,
                unused_only: arg_bool(args, "unused_only", false)?,
                attributes: arg_optional_string_array(args, "attributes")?,
                conditions: arg_optional_object(args, "conditions")?,
            };
            let result = gateway.list_participants(sid, query).await?;
            summarize(count_summary("participant", &result), &result)
        }
        "get_participant_properties" => {
            let sid = required_i64(args, "survey_id")?;
            let query = required_object(args, "query")?;
            let properties = arg_optional_string_array(args, "properties")?;
            let result = gateway
                .get_participant_properties(sid, query, properties)
                .await?;
            summarize(format!("Participant of survey {sid}"), &result)
        }
        "add_participants" => {
            let sid = required_i64(args, "survey_id")?;
            let rows = required_object_array(args, "participants")?;
            let create_tokens = arg_bool(args, "create_tokens", true)?;
            let count = rows.len();
            let result = gateway.add_participants(sid, rows, create_tokens).await?;
            summarize(format!("Added {count} participant(s) to survey {sid}"), &result)
        }
        "set_participant_properties" => {
            let sid = required_i64(args, "survey_id")?;
            let query = required_object(args, "query")?;
            let data = required_object(args, "data")?;
            let result = gateway.set_participant_properties(sid, query, data).await?;
            summarize(format!("Updated participant of survey {sid}"), &result)
        }
        "delete_participants" => {
            let sid = required_i64(args, "survey_id")?;
            let ids = required_i64_array(args, "participant_ids")?;
            let count = ids.len();
            let result = gateway.delete_participants(sid, ids).await?;
            summarize(format!("Deleted {count} participant(s) from survey {sid}"), &result)
        }
        "invite_participants" => {
            let sid = required_i64(args, "survey_id")?;
            let ids = arg_optional_i64_array(args, "participant_ids")?;
            let email_all = arg_bool(args, "email_all", false)?;
            let result = gateway.invite_participants(sid, ids, email_all).await?;
            summarize(format!("Sent invitations for survey {sid}"), &result)
        }
        "remind_participants" => {
            let sid = required_i64(args, "survey_id")?;
            let min_days = arg_optional_i64(args, "min_days_between")?;
            let max_reminders = arg_optional_i64(args, "max_reminders")?;
            let ids = arg_optional_i64_array(args, "participant_ids")?;
            let result = gateway
                .remind_participants(sid, min_days, max_reminders, ids)
                .await?;
            summarize(format!("Sent reminders for survey {sid}"), &result)
        }
        "list_responses" => {
            let sid = required_i64(args, "survey_id")?;
            let token = arg_optional_string(args, "token")?;
            let result = gateway.list_responses(sid, token.as_deref()).await?;
            summarize(count_summary("response", &result), &result)
        }
        "export_responses" => {
            let sid = required_i64(args, "survey_id")?;
            let options = export_options(args)?;
            let from = arg_optional_i64(args, "from_response_id")?;
            let to = arg_optional_i64(args, "to_response_id")?;
            let format = options.format;
            let result = gateway.export_responses(sid, options, from, to).await?;
            export_preview(
                format!("Exported responses of survey {sid} ({})", format.as_str()),
                &result,
                format.is_text(),
            )
        }
        "export_responses_by_token" => {
            let sid = required_i64(args, "survey_id")?;
            let token = required_string(args, "token")?;
            let options = export_options(args)?;
            let format = options.format;
            let result = gateway
                .export_responses_by_token(sid, &token, options)
                .await?;
            export_preview(
                format!(
                    "Exported responses of token '{token}' in survey {sid} ({})",
                    format.as_str()
                ),
                &result,
                format.is_text(),
            )
        }
        "import_response" => {
            let sid = required_i64(args, "survey_id")?;
            let data = required_object(args, "data")?;
            let result = gateway.import_response(sid, data).await?;
            summarize(format!("Imported response into survey {sid}"), &result)
        }
        "update_response" => {
            let sid = required_i64(args, "survey_id")?;
            let data = required_object(args, "data")?;
            let response_id = data
                .get("id")
                .filter(|id| !id.is_null())
                .cloned()
                .ok_or_else(|| {
                    ToolError::validation("data", "'data' must include the response 'id'")
                })?;
            let result = gateway.update_response(sid, data).await?;
            summarize(
                format!("Updated response {} of survey {sid}", display_id(&response_id)),
                &result,
            )
        }
        "delete_response" => {
            let sid = required_i64(args, "survey_id")?;
            let rid = required_i64(args, "response_id")?;
            let result = gateway.delete_response(sid, rid).await?;
            summarize(format!("Deleted response {rid} of survey {sid}"), &result)
        }
        "delete_all_responses" => {
            let sid = required_i64(args, "survey_id")?;
            let result = gateway.delete_all_responses(sid).await?;
            summarize(format!("Deleted all responses of survey {sid}"), &result)
        }
        "reset_responses" => {
            let sid = required_i64(args, "survey_id")?;
            let result = gateway.reset_responses(sid).await?;
            summarize(format!("Reset responses of survey {sid}"), &result)
        }
        "export_statistics" => {
            let sid = required_i64(args, "survey_id")?;
            let format = arg_enum(
                args,
                "format",
                StatisticsFormat::Pdf,
                StatisticsFormat::parse,
                &StatisticsFormat::names(),
            )?;
            let language = arg_optional_string(args, "language")?;
            let graphs = arg_bool(args, "include_graphs", false)?;
            let groups = arg_optional_i64_array(args, "group_ids")?;
            let result = gateway
                .export_statistics(sid, format, language.as_deref(), graphs, groups)
                .await?;
            export_preview(
                format!("Exported statistics of survey {sid} ({})", format.as_str()),
                &result,
                format.is_text(),
            )
        }
        "export_timeline" => {
            let sid = required_i64(args, "survey_id")?;
            let period = arg_enum(
                args,
                "period",
                TimelinePeriod::Day,
                TimelinePeriod::parse,
                &TimelinePeriod::names(),
            )?;
            let start = required_date(args, "start")?;
            let end = required_date(args, "end")?;
            let result = gateway.export_timeline(sid, period, &start, &end).await?;
            summarize(
                format!(
                    "Responses per {} for survey {sid} from {start} to {end}",
                    period.as_str()
                ),
                &result,
            )
        }
        "upload_file" => {
            let sid = required_i64(args, "survey_id")?;
            let field = required_string(args, "field_name")?;
            let file_name = required_string(args, "file_name")?;
            let content = required_base64(args, "content_base64")?;
            let result = gateway
                .upload_file(sid, &field, &file_name, &content)
                .await?;
            summarize(format!("Uploaded '{file_name}' to {field}"), &result)
        }
        "list_uploaded_files" => {
            let sid = required_i64(args, "survey_id")?;
            let token = arg_optional_string(args, "token")?;
            let rid = arg_optional_i64(args, "response_id")?;
            let result = gateway
                .list_uploaded_files(sid, token.as_deref(), rid)
                .await?;
            summarize(format!("Uploaded files of survey {sid}"), &result)
        }
        "list_quotas" => {
            let sid = required_i64(args, "survey_id")?;
            let result = gateway.list_quotas(sid).await?;
            summarize(count_summary("quota", &result), &result)
        }
        "get_quota_properties" => {
            let quota_id = required_i64(args, "quota_id")?;
            let settings = arg_optional_string_array(args, "settings")?;
            let language = arg_optional_string(args, "language")?;
            let result = gateway
                .get_quota_properties(quota_id, settings, language.as_deref())
                .await?;
            summarize(format!("Properties of quota {quota_id}"), &result)
        }
        "list_users" => {
            let uid = arg_optional_i64(args, "user_id")?;
            let result = gateway.list_users(uid).await?;
            summarize(count_summary("user", &result), &result)
        }
        "get_user_details" => {
            let uid = required_i64(args, "user_id")?;
            let result = gateway.get_user_details(uid).await?;
            summarize(format!("Details of user {uid}"), &result)
        }
        "get_site_settings" => {
            let setting = required_string(args, "setting_name")?;
            let result = gateway.get_site_settings(&setting).await?;
            match decode_string_list(&result) {
                Some(values) => summarize(
                    format!("Site setting '{setting}' ({} value(s))", values.len()),
                    &json!(values),
                ),
                None => site_setting_output(&setting, &result),
            }
        }
        "get_language_properties" => {
            let sid = required_i64(args, "survey_id")?;
            let settings = arg_optional_string_array(args, "settings")?;
            let language = arg_optional_string(args, "language")?;
            let result = gateway
                .get_language_properties(sid, settings, language.as_deref())
                .await?;
            summarize(format!("Language properties of survey {sid}"), &result)
        }
        "get_fieldmap" => {
            let sid = required_i64(args, "survey_id")?;
            let language = arg_optional_string(args, "language")?;
            let result = gateway.get_fieldmap(sid, language.as_deref()).await?;
            summarize(format!("Field map of survey {sid}"), &result)
        }
        other => {
            return Err(ToolError::new("unknown_tool", format!("Unknown tool: {other}"))
                .with_field("name"));
        }
    };
    Ok(output)
}

fn count_summary(noun: &str, result: &Value) -> String {
    match result {
        Value::Array(items) => format!("Found {} {noun}(s)", items.len()),
        Value::Object(map) if !map.contains_key("status") => {
            format!("Found {} {noun}(s)", map.len())
        }
        _ => format!("Listed {noun}s"),
    }
}

fn display_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn site_setting_output(setting: &str, result: &Value) -> ToolOutput {
    match result {
        Value::String(s) if !s.is_empty() => {
            ToolOutput::summary_only(format!("Site setting '{setting}': {s}"))
        }
        Value::Number(_) | Value::Bool(_) => {
            ToolOutput::summary_only(format!("Site setting '{setting}': {}", to_pretty_json(result)))
        }
        _ => summarize(format!("Site setting '{setting}'"), result),
    }
}
