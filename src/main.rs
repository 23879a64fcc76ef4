use minish::Interpreter;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

fn main() -> anyhow::Result<()> {
    let mut interpreter = Interpreter::default();
    let mut editor = DefaultEditor::new()?;

    loop {
        let prompt = interpreter.env().prompt();
        match editor.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                if let Err(e) = interpreter.eval(&line) {
                    eprintln!("{}", e);
                }
                if interpreter.should_exit() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}", e);
                break;
            }
        }
    }

    Ok(())
}
