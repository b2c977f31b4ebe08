use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    bundlefs completions bash > ~/.bash_completion.d/bundlefs\n\n\
                  Generate zsh completions:\n    bundlefs completions zsh > ~/.zfunc/_bundlefs\n\n\
                  Generate fish completions:\n    bundlefs completions fish > ~/.config/fish/completions/bundlefs.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
