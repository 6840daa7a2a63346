use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde_with::serde_conv;
use url::Url;

use crate::types::Institution;

pub const RPC_PATH: &str = "/WebUntis/jsonrpc.do";
pub const CLIENT_NAME: &str = "FehlzeitenTool";
pub const USER_AGENT: &str = "FehlzeitenTool/1.0";

pub const AUTHENTICATE_METHOD: &str = "authenticate";
pub const LOGOUT_METHOD: &str = "logout";
pub const CLASSES_METHOD: &str = "getKlassen";
pub const STUDENTS_METHOD: &str = "getStudents";
pub const ABSENCES_METHOD: &str = "getStudentAbsences";
pub const EVENTS_METHOD: &str = "getClassregEvents";

/// Element type WebUntis uses for students when addressing class register data.
pub const STUDENT_ELEMENT_TYPE: u8 = 5;

pub fn rpc_url(institution: &Institution) -> Result<Url> {
    let base = format!("https://{}{RPC_PATH}", institution.server());
    let mut url = Url::parse(&base)
        .with_context(|| format!("invalid WebUntis server `{}`", institution.server()))?;
    url.query_pairs_mut()
        .append_pair("school", institution.school());
    Ok(url)
}

/// WebUntis encodes dates as integers of the form `yyyymmdd`.
pub fn untis_date(date: NaiveDate) -> u32 {
    let year = u32::try_from(date.year()).unwrap_or(0);
    year * 10_000 + date.month() * 100 + date.day()
}

pub fn parse_untis_date(value: u32) -> Option<NaiveDate> {
    let year = i32::try_from(value / 10_000).ok()?;
    NaiveDate::from_ymd_opt(year, (value / 100) % 100, value % 100)
}

serde_conv! {
    pub(crate) UntisDate,
    NaiveDate,
    |date: &NaiveDate| untis_date(*date),
    |value: u32| -> Result<_, String> {
        parse_untis_date(value).ok_or_else(|| format!("invalid WebUntis date `{value}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untis_dates_are_yyyymmdd() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        assert_eq!(untis_date(date), 20250210);
        assert_eq!(parse_untis_date(20250723), NaiveDate::from_ymd_opt(2025, 7, 23));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert_eq!(parse_untis_date(20250230), None);
        assert_eq!(parse_untis_date(20251301), None);
    }

    #[test]
    fn rpc_url_carries_school() {
        let institution = Institution::new(
            "borys.webuntis.com".to_owned(),
            "Carl-v.-Ossietzky-GYM".to_owned(),
        );
        let url = rpc_url(&institution).unwrap();
        assert_eq!(url.host_str(), Some("borys.webuntis.com"));
        assert_eq!(url.path(), RPC_PATH);
        assert_eq!(
            url.query_pairs().collect::<Vec<_>>(),
            vec![("school".into(), "Carl-v.-Ossietzky-GYM".into())]
        );
    }
}
