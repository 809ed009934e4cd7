use crate::flow::{FlowState, LinkIssued, ResolvedCase, StepOneForm, VerdictShown};
use crate::links::DeepLink;
use askama::Template;
use fairfight_judge::speech_tag;
use fairfight_protocol::Theme;

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>FairFight AI • {{ title }}</title>
    <style>
      body { font-family: system-ui, sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem; color: #1f2937; }
      label { display: block; margin-top: .75rem; font-weight: 600; }
      input, select, textarea { width: 100%; padding: .5rem; margin-top: .25rem; box-sizing: border-box; }
      textarea { min-height: 8rem; }
      button { margin-top: 1rem; padding: .6rem 1.2rem; font-size: 1rem; }
      .columns { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }
      .warning { background: #fef3c7; padding: .75rem; border-radius: .4rem; }
      .error { background: #fee2e2; padding: .75rem; border-radius: .4rem; }
      .success { background: #dcfce7; padding: .75rem; border-radius: .4rem; }
      .info { background: #e0f2fe; padding: .75rem; border-radius: .4rem; white-space: pre-wrap; }
      code { display: block; word-break: break-all; background: #f3f4f6; padding: .5rem; }
      .caption { color: #6b7280; font-size: .9rem; }
    </style>
  </head>
  <body>
    <header>
      <h1>🤖 FairFight AI</h1>
      <p class="caption">Because every conflict deserves a fair verdict.</p>
    </header>
    <main>
{{ body|safe }}
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct Layout<'a> {
    title: &'a str,
    body: &'a str,
}

struct ThemeOption {
    value: &'static str,
    label: String,
    selected: bool,
}

#[derive(Template)]
#[template(
    source = r#"<form method="get" action="/">
  <label for="theme-select">Choose a conflict type:</label>
  <select id="theme-select" name="theme" onchange="this.form.submit()">
    {% for option in themes %}
    <option value="{{ option.value }}"{% if option.selected %} selected{% endif %}>{{ option.label }}</option>
    {% endfor %}
  </select>
</form>
<h2>1️⃣ {{ theme }} Conflict - Step 1: User 1</h2>
{% if !warning.is_empty() %}<p class="warning">⚠️ {{ warning }}</p>{% endif %}
<form method="post" action="/cases">
  <input type="hidden" name="theme" value="{{ theme }}" />
  <div class="columns">
    <div>
      <label>🧑 User 1 Name <input name="user1_name" value="{{ form.user1_name }}" /></label>
      <label>📧 User 1 Email <input type="email" name="user1_email" value="{{ form.user1_email }}" /></label>
      <label>📱 User 1 WhatsApp <input name="user1_phone" value="{{ form.user1_phone }}" /></label>
    </div>
    <div>
      <label>👩 User 2 Name <input name="user2_name" value="{{ form.user2_name }}" /></label>
      <label>📧 User 2 Email <input type="email" name="user2_email" value="{{ form.user2_email }}" /></label>
      <label>📱 User 2 WhatsApp <input name="user2_phone" value="{{ form.user2_phone }}" /></label>
    </div>
  </div>
  <label>🧑 Describe your version <textarea name="user1_input">{{ form.user1_input }}</textarea></label>
  <button type="submit">📤 Generate link and send to User 2</button>
</form>"#,
    ext = "html"
)]
struct CollectATemplate<'a> {
    theme: Theme,
    themes: Vec<ThemeOption>,
    form: &'a StepOneForm,
    warning: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<h2>1️⃣ {{ issued.draft.theme }} Conflict - Step 1: User 1</h2>
<p class="success">✅ Link generated!</p>
{% if issued.token.is_none() %}<p class="warning">⚠️ The case could not be saved, so this link carries the whole case.</p>{% endif %}
<code>{{ issued.share_link }}</code>
<ul>
  {% for link in issued.notify %}
  <li><a href="{{ link.href }}">{{ link.label }}</a></li>
  {% endfor %}
</ul>
{% if issued.token.is_some() %}
<details>
  <summary>Fallback link (URL-embedded data)</summary>
  <code>{{ issued.fallback_link }}</code>
  <p class="caption">Use only if the main link fails. This one is longer and more fragile.</p>
</details>
{% endif %}"#,
    ext = "html"
)]
struct LinkIssuedTemplate<'a> {
    issued: &'a LinkIssued,
}

#[derive(Template)]
#[template(
    source = r#"<h2>2️⃣ {{ case.theme }} - Step 2: {{ case.party_b.name }} Responds</h2>
<p><strong>🧑 {{ case.party_a.name }} said:</strong></p>
<div class="info">{{ case.statement_a }}</div>
{% if !warning.is_empty() %}<p class="warning">⚠️ {{ warning }}</p>{% endif %}
<form method="post" action="/verdicts">
  {% for (name, value) in hidden %}
  <input type="hidden" name="{{ name }}" value="{{ value }}" />
  {% endfor %}
  <label>👩 {{ case.party_b.name }}, your version <textarea name="user2_input">{{ statement_b }}</textarea></label>
  <button type="submit">🧠 Get Verdict from JudgeBot</button>
</form>"#,
    ext = "html"
)]
struct CollectBTemplate<'a> {
    case: &'a ResolvedCase,
    hidden: Vec<(&'static str, &'a str)>,
    statement_b: &'a str,
    warning: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<h2>2️⃣ {{ shown.case.theme }} - Step 2: {{ shown.case.party_b.name }} Responds</h2>
{% if shown.judgement.failed %}
<p class="error">{{ shown.judgement.text }}</p>
{% else %}
<p class="success">✅ Verdict delivered!</p>
<article>{{ verdict_html|safe }}</article>
{% match speech_lang %}
{% when Some with (lang) %}
<p>
  <button type="button" id="listen" data-lang="{{ lang }}" data-text="{{ shown.judgement.text }}">🔈 Listen</button>
  <span id="listen-warning" class="warning" hidden>🔈 Could not generate speech: this browser has no speech synthesis.</span>
</p>
<script>
  (function () {
    var button = document.getElementById("listen");
    if (!("speechSynthesis" in window)) {
      button.hidden = true;
      document.getElementById("listen-warning").hidden = false;
      return;
    }
    button.addEventListener("click", function () {
      var utterance = new SpeechSynthesisUtterance(button.dataset.text);
      utterance.lang = button.dataset.lang;
      window.speechSynthesis.cancel();
      window.speechSynthesis.speak(utterance);
    });
  })();
</script>
{% when None %}
<p class="warning">🔈 Could not generate speech: no voice for language {{ shown.judgement.language }}.</p>
{% endmatch %}
{% endif %}
{% if !score.is_empty() %}<p>📊 {{ score }}</p>{% endif %}
{% if !outcome.is_empty() %}<p><strong>🏆 {{ outcome }}</strong></p>{% endif %}
<ul>
  {% for link in notify %}
  <li><a href="{{ link.href }}">{{ link.label }}</a></li>
  {% endfor %}
</ul>"#,
    ext = "html"
)]
struct VerdictTemplate<'a> {
    shown: &'a VerdictShown,
    verdict_html: String,
    speech_lang: Option<&'static str>,
    score: String,
    outcome: String,
    notify: &'a [DeepLink],
}

#[derive(Template)]
#[template(
    source = r#"<p class="error">❌ The link appears corrupted. Ask {{ sender }} to resend the link.</p>
<p><a href="/">Start a new conflict</a></p>"#,
    ext = "html"
)]
struct CorruptedLinkTemplate<'a> {
    sender: &'a str,
}

pub fn collect_a(theme: Theme, form: &StepOneForm, warning: Option<&str>) -> String {
    let themes = Theme::ALL
        .into_iter()
        .map(|option| ThemeOption {
            value: option.as_str(),
            label: format!("{} {}", option.as_str(), option.emoji()),
            selected: option == theme,
        })
        .collect();
    let body = render(&CollectATemplate {
        theme,
        themes,
        form,
        warning: warning.unwrap_or_default(),
    });
    page("Step 1", &body)
}

pub fn link_issued(issued: &LinkIssued) -> String {
    page("Link generated", &render(&LinkIssuedTemplate { issued }))
}

pub fn collect_b(case: &ResolvedCase, statement_b: &str, warning: Option<&str>) -> String {
    let link = &case.link;
    let hidden = [
        ("step", &link.step),
        ("token", &link.token),
        ("theme", &link.theme),
        ("user1_name", &link.user1_name),
        ("user2_name", &link.user2_name),
        ("user1_input", &link.user1_input),
        ("user1_email", &link.user1_email),
        ("user2_email", &link.user2_email),
        ("user1_phone", &link.user1_phone),
        ("user2_phone", &link.user2_phone),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
    .collect();
    let body = render(&CollectBTemplate {
        case,
        hidden,
        statement_b,
        warning: warning.unwrap_or_default(),
    });
    page("Step 2", &body)
}

pub fn verdict(shown: &VerdictShown) -> String {
    let score = shown
        .win_split
        .map(|split| {
            format!(
                "{}: {}% | {}: {}%",
                shown.case.party_a.name, split.party_a, shown.case.party_b.name, split.party_b
            )
        })
        .unwrap_or_default();
    let body = render(&VerdictTemplate {
        shown,
        verdict_html: markdown::to_html(&shown.judgement.text),
        speech_lang: speech_tag(&shown.judgement.language),
        score,
        outcome: shown.outcome_label().unwrap_or_default(),
        notify: &shown.notify,
    });
    page("Verdict", &body)
}

pub fn corrupted_link(sender: Option<&str>) -> String {
    let body = render(&CorruptedLinkTemplate {
        sender: sender.unwrap_or("User 1"),
    });
    page("Corrupted link", &body)
}

/// Page for any state without a pending warning.
pub fn state(state: &FlowState) -> String {
    match state {
        FlowState::CollectA { theme } => collect_a(*theme, &StepOneForm::default(), None),
        FlowState::LinkIssued(issued) => link_issued(issued),
        FlowState::CollectB(case) => collect_b(case, "", None),
        FlowState::VerdictShown(shown) => verdict(shown),
        FlowState::CorruptedLink => corrupted_link(None),
    }
}

fn page(title: &str, body: &str) -> String {
    render(&Layout { title, body })
}

fn render<T: Template>(template: &T) -> String {
    template.render().unwrap_or_else(|err| {
        log::error!("Template rendering failed: {err}");
        "<p class=\"error\">Something went wrong while rendering this page.</p>".to_string()
    })
}
