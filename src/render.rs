use chrono::{DateTime, Days, NaiveTime, Utc};

use regex::Regex;

use crate::model::{DraftMessage, RenderedMessage};

/// All programme emails go out at the same fixed hour (UTC)
pub const SEND_HOUR_UTC: u32 = 8;

/// Compute the delivery instant for a 1-indexed curriculum day: day 1 is
/// the enrollment day itself at the fixed hour, day N is N-1 days later.
pub fn send_time(now: DateTime<Utc>, day: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(SEND_HOUR_UTC, 0, 0).expect("valid fixed send hour");
    let date = now.date_naive() + Days::new(u64::from(day.saturating_sub(1)));

    date.and_time(time).and_utc()
}

/// Turn a draft into its deliverable form. Pure: the caller supplies `now`,
/// so the same draft and instant always render identically.
pub fn render(draft: &DraftMessage, now: DateTime<Utc>) -> RenderedMessage {
    RenderedMessage {
        subject: draft.subject.clone(),
        scheduled_for: send_time(now, draft.day),
        text_body: draft.plain_text.clone(),
        html_body: build_html(draft),
    }
}

/// The HTML variant is derived from the same authored text as the plain
/// body: paragraphs split on blank lines, single newlines kept as breaks.
fn build_html(draft: &DraftMessage) -> String {
    lazy_static::lazy_static! {
        static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n\s*\n").unwrap();
    }

    let paragraphs: String = PARAGRAPH_BREAK
        .split(&draft.plain_text)
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            format!(
                "<p style=\"margin:0 0 18px 0;line-height:1.85\">{}</p>",
                p.trim().replace('\n', "<br>")
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html><html><head><meta charset="utf-8"></head>
<body style="margin:0;padding:0;background:#0d1018;font-family:Georgia,serif">
<table width="100%" cellpadding="0" cellspacing="0"><tr><td align="center" style="padding:40px 16px">
<table width="600" cellpadding="0" cellspacing="0" style="background:#111418;border:1px solid #1e2028;max-width:600px;width:100%">
  <tr><td style="padding:28px 44px 22px;border-bottom:1px solid #1e2028">
    <div style="font-family:'Courier New',monospace;font-size:10px;letter-spacing:.3em;text-transform:uppercase;color:#e05252;margin-bottom:6px">&#11044; Jinshi</div>
    <div style="font-family:'Courier New',monospace;font-size:10px;letter-spacing:.18em;text-transform:uppercase;color:#3a3830">Day {day} of 100 &middot; {theme}</div>
  </td></tr>
  <tr><td style="padding:32px 44px 28px;color:#a8a298;font-size:16px">{paragraphs}</td></tr>
  <tr><td style="padding:18px 44px 28px;border-top:1px solid #1e2028">
    <div style="font-family:'Courier New',monospace;font-size:10px;color:#2a2820;line-height:1.7">
      You enrolled in the 100-day coaching programme.<br>
      <a href="{{{{unsubscribe_url}}}}" style="color:#3a3830">Unsubscribe</a>
    </div>
  </td></tr>
</table></td></tr></table></body></html>"#,
        day = draft.day,
        theme = draft.theme,
        paragraphs = paragraphs,
    )
}
