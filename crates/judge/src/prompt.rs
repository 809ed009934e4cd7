use fairfight_protocol::Theme;

/// JudgeBot persona, bound to the conflict theme. Always written in English;
/// the engine may translate it before dispatch.
pub fn system_instruction(theme: Theme, name_a: &str, name_b: &str) -> String {
    format!(
        "You are JudgeBot, an impartial AI judge for {kind} conflicts. \
         Analyze both sides carefully, highlight the key arguments from each, and give a fair verdict. \
         Clearly state who is more reasonable, and give a win percentage for each person by name \
         (for example: {name_a}: 60%, {name_b}: 40%). \
         Respond in the language the participants wrote in.",
        kind = theme.conflict_kind(),
    )
}

pub fn user_prompt(name_a: &str, statement_a: &str, name_b: &str, statement_b: &str) -> String {
    format!(
        "{name_a} says:\n{statement_a}\n\n\
         {name_b} says:\n{statement_b}\n\n\
         Who is more reasonable and why? Provide a win percentage for each of you."
    )
}
