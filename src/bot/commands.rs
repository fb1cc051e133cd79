use teloxide::utils::command::BotCommands;

/// Commands advertised in the Telegram client menu. The text itself is interpreted by
/// the conversation machine, which also accepts the keyboard button labels.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "главное меню")]
    Start,
    #[command(rename = "checkin", description = "отметить вход")]
    CheckIn,
    #[command(description = "продать билет")]
    Sell,
    #[command(description = "отменить текущую операцию")]
    Cancel,
    #[command(description = "список команд")]
    Help,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/checkin", "AfterpartyBot").unwrap(), Command::CheckIn);
        assert_eq!(Command::parse("/sell@AfterpartyBot", "AfterpartyBot").unwrap(), Command::Sell);
        assert!(Command::parse("/refund", "AfterpartyBot").is_err());
    }

    #[test]
    fn test_command_list() {
        let names: Vec<String> = Command::bot_commands()
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert_eq!(names.len(), 5);
        assert!(names.iter().any(|n| n.ends_with("checkin")));
    }
}
