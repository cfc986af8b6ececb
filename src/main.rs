use clap::{arg,crate_version,Command};
use retrocompressor::{huffman,bwt,lzss,lzw,ppmc};

const RCH: &str = "unreachable was reached";

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::init();

    let long_help =
"Examples:
---------
Compress:      `retrocompressor compress -m ppmc -i my_file -o my_file.cmp`
Expand:        `retrocompressor expand -m ppmc -i my_file.cmp -o my_file`";

    let methods = ["huffman","bwt","lzss","lzw","ppmc"];

    let mut main_cmd = Command::new("retrocompressor")
        .about("Compress and expand with retro compression algorithms")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(methods)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(--order <ORDER> "PPMC model order (0-4)").required(false))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(methods)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(--order <ORDER> "PPMC model order (0-4)").required(false))
        .about("expand a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        let order: usize = cmd.get_one::<String>("order")
            .map(|s| s.parse().expect("order must be a number"))
            .unwrap_or(ppmc::STD_ORDER);
        let mut input = std::fs::File::open(path_in)?;
        let mut output = std::fs::File::create(path_out)?;
        log::info!("compressing {} with {}", path_in, method);
        match method.as_str() {
            "huffman" => huffman::compress(&mut input,&mut output)?,
            "bwt" => bwt::compress(&mut input,&mut output)?,
            "lzss" => lzss::compress(&mut input,&mut output)?,
            "lzw" => lzw::compress(&mut input,&mut output)?,
            "ppmc" => ppmc::compress(&mut input,&mut output,order)?,
            _ => unreachable!("{RCH}: clap already validated method"),
        };
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        let order: usize = cmd.get_one::<String>("order")
            .map(|s| s.parse().expect("order must be a number"))
            .unwrap_or(ppmc::STD_ORDER);
        let mut input = std::fs::File::open(path_in)?;
        let mut output = std::fs::File::create(path_out)?;
        log::info!("expanding {} with {}", path_in, method);
        match method.as_str() {
            "huffman" => huffman::expand(&mut input,&mut output)?,
            "bwt" => bwt::expand(&mut input,&mut output)?,
            "lzss" => lzss::expand(&mut input,&mut output)?,
            "lzw" => lzw::expand(&mut input,&mut output)?,
            "ppmc" => ppmc::expand(&mut input,&mut output,order)?,
            _ => unreachable!("{RCH}: clap already validated method"),
        };
    }

    Ok(())
}
