use std::io;

use flipboard::Shell;

fn main() -> anyhow::Result<()> {
    flipboard::print_engine_info();
    flipboard::print_binary_info();

    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    Shell::new(&mut input, &mut output).run()
}
