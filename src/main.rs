use clap::{arg,crate_version,Command};
use huffpack::{container,GuardBound,TieBreak,STD_OPTIONS};
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const RCH: &str = "unreachable was reached";

fn ok_to_overwrite(path_out: &str) -> bool {
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        std::io::stdin().read_line(&mut ans).expect("could not read stdin");
        if ans.trim_end()=="y" || ans.trim_end()=="Y" {
            log::warn!("existing file will be truncated to the new length");
            return true;
        }
        return false;
    }
    true
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `huffpack compress -i my_expanded -o my_compressed`
Expand:        `huffpack expand -i my_compressed -o my_expanded`
Show codes:    `huffpack table -i my_compressed`";

    let mut main_cmd = Command::new("huffpack")
        .about("Compress and expand with static Huffman codes")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(-t --"tie-break" <ORDER> "order of symbols with equal frequency").value_parser(["scan","value"])
            .required(false).default_value("scan"))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(-g --guard <BOUND> "longest code to try before declaring corruption").value_parser(["depth","byte"])
            .required(false).default_value("depth"))
        .about("expand a file"));

    main_cmd = main_cmd.subcommand(Command::new("table")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .about("print the code table of a compressed file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let mut opt = STD_OPTIONS;
        opt.tie_break = match cmd.get_one::<String>("tie-break").expect(RCH).as_str() {
            "value" => TieBreak::ByteValue,
            _ => TieBreak::ScanOrder
        };
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = std::fs::OpenOptions::new().write(true).truncate(false).create(true).open(path_out)?;
        let (in_size,out_size) = container::compress(&mut in_file,&mut out_file,&opt)?;
        out_file.set_len(out_size)?;
        eprintln!("compressed {} into {}",in_size,out_size);
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let mut opt = STD_OPTIONS;
        opt.guard = match cmd.get_one::<String>("guard").expect(RCH).as_str() {
            "byte" => GuardBound::ByteWidth,
            _ => GuardBound::MaxCodeLength
        };
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = std::fs::OpenOptions::new().write(true).truncate(false).create(true).open(path_out)?;
        let (in_size,out_size) = container::expand(&mut in_file,&mut out_file,&opt)?;
        out_file.set_len(out_size)?;
        eprintln!("expanded {} into {}",in_size,out_size);
    }

    if let Some(cmd) = matches.subcommand_matches("table") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let mut in_file = std::fs::File::open(path_in)?;
        let table = container::read_table(&mut in_file)?;
        println!("symbol  length  code");
        for symb in table.symbols() {
            println!("{:02X}      {:<6}  {}",symb.value,symb.code_len,symb.code_string());
        }
        table.release();
    }

    Ok(())
}
