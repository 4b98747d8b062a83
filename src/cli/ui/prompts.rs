use anyhow::{Result, bail};
use dialoguer::{Confirm, Input, Password};
use is_terminal::IsTerminal;

pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// Asks for confirmation; `assume_yes` skips the prompt, and without a terminal the answer is no
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !is_interactive() {
        bail!("Confirmação necessária: execute novamente com --yes");
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Returns `value` or prompts for it when running in a terminal
pub fn text_or_prompt(value: Option<String>, prompt: &str, flag: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None if is_interactive() => Ok(Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()?),
        None => bail!("{} é obrigatório fora de um terminal", flag),
    }
}

pub fn password_or_prompt(value: Option<String>, confirm_new: bool) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None if is_interactive() => {
            let mut prompt = Password::new().with_prompt("Senha");
            if confirm_new {
                prompt = prompt.with_confirmation("Confirme a senha", "As senhas não conferem");
            }
            Ok(prompt.interact()?)
        }
        None => bail!("--password é obrigatório fora de um terminal"),
    }
}
