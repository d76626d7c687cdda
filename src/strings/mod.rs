//! # User-Facing Texts
//!
//! Canned replies and the help listing. Content formatting is deliberately
//! kept out of the dispatch core; handlers pull their wording from here.

pub const HELP: &str = "At your service\n\
**help**: this help\n\
**add [user] [user]**: announce streams for the listed users\n\
**remove [user] [user]**: stop announcing streams for the listed users\n\
**announce [user] [user]**: announce any current streams for the listed users\n\
**list**: list users whose streams will be announced\n\
**resub**: re-subscribe all currently announced users\n\
**idea [some brilliant idea]**: add a new card to the project board\n\
**[status|playing|streaming|listening|watching] <text>**: set the bot's status";

pub const NO_USERS_FOUND: &str = "Sorry, old bean. I couldn't find anyone.";
pub const NOTHING_DOING: &str = "Nothing doing, I'm afraid";
pub const LIST_EMPTY: &str = "Sorry, I can't seem to find my notes";
pub const RESUB_LOST: &str = "I appear to have lost my users";
pub const COMMAND_FAILED: &str = "Terribly sorry, that didn't quite work";
pub const BOARD_UNCONFIGURED: &str = "I'm afraid I don't have a project board to hand";

pub fn greeting(greeting: &str, mention: &str) -> String {
    format!("{greeting} {mention}!")
}

pub fn subscribed(names: &str) -> String {
    format!("Right-ho, I've asked those lovely chaps to tell me when **{names}** goes live")
}

pub fn unsubscribed(names: &str) -> String {
    format!("Right-ho, I've asked those lovely chaps to stop telling me about **{names}**")
}

pub fn announced(names: &str) -> String {
    format!("Announced {names}")
}

pub fn subscription_list(names: &str) -> String {
    format!("I will be told about **{names}**")
}
