use crate::calc::{self, display_percentage, Eligibility};
use crate::record::AttendanceRecord;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

/// Everything but unreserved characters and `/` is escaped.
const MESSAGE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

const WHATSAPP_BASE: &str = "https://wa.me";
const COUNTRY_CODE: &str = "91";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub link: String,
    pub status: Eligibility,
    pub percentage: f64,
}

/// Parent message and a prefilled WhatsApp deep link for one student.
pub fn compose(record: &AttendanceRecord) -> Notification {
    let summary = calc::compute_record(record);
    let message = match summary.status {
        Eligibility::NotEligible => below_threshold_message(record, summary.percentage),
        Eligibility::Eligible => acknowledgement_message(record, summary.percentage),
    };
    let link = whatsapp_link(record.parent_mobile, &message);
    Notification {
        message,
        link,
        status: summary.status,
        percentage: summary.percentage,
    }
}

pub fn whatsapp_link(parent_mobile: u64, message: &str) -> String {
    format!(
        "{WHATSAPP_BASE}/{COUNTRY_CODE}{parent_mobile}?text={}",
        utf8_percent_encode(message, MESSAGE_ENCODE_SET)
    )
}

fn below_threshold_message(record: &AttendanceRecord, percentage: f64) -> String {
    let pct = display_percentage(record.total_classes, percentage);
    format!(
        "Dear Parent/Guardian,\n\
         \n\
         Your child *{name}* attendance is *{pct}%* which is *less than the required 75%*.\n\
         \n\
         *Attendance Details:*\n\
         • Classes Attended: {attended}\n\
         • Total Classes: {total}\n\
         • Current Attendance: {pct}%\n\
         \n\
         *Action Required:*\n\
         Please ensure your child attends classes regularly to maintain the minimum 75% attendance requirement.\n\
         \n\
         Thank you for your cooperation.",
        name = record.name,
        attended = record.attended,
        total = record.total_classes,
    )
}

fn acknowledgement_message(record: &AttendanceRecord, percentage: f64) -> String {
    let pct = display_percentage(record.total_classes, percentage);
    format!(
        "Dear Parent/Guardian,\n\
         \n\
         Your child *{name}* attendance is *{pct}%* which meets the required standard.\n\
         \n\
         *Attendance Details:*\n\
         • Classes Attended: {attended}\n\
         • Total Classes: {total}\n\
         • Current Attendance: {pct}%\n\
         \n\
         Keep up the good attendance!\n\
         \n\
         Thank you.",
        name = record.name,
        attended = record.attended,
        total = record.total_classes,
    )
}
