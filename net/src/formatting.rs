/*
Builds fixed width plain text columns for output to a terminal
*/

/// Implement this trait on structs that can be output in plain text
pub trait ToPlainText {
    /// Writes out the fields as plain text, in columns and all on one line with a line break at the end
    fn to_plain_text(self: &Self, builder: &mut PlainTextBuilder);
}

pub struct PlainTextBuilder {
    buffer: String,
    begining_of_line: bool,
}

impl PlainTextBuilder {
    pub fn new() -> Self {
        Self {
            buffer: String::with_capacity(200),
            begining_of_line: true,
        }
    }

    pub fn build(self: Self) -> String {
        self.buffer
    }

    /// Returns the lines written so far without their line breaks
    pub fn build_lines(self: Self) -> Vec<String> {
        self.buffer.lines().map(|line| line.trim_end().to_owned()).collect()
    }

    pub fn new_line(self: &mut Self) {
        if !self.begining_of_line {
            self.buffer.push_str("\n");
            self.begining_of_line = true;
        }
    }

    pub fn str_left(self: &mut Self, text: &str, width: usize) {
        self.begining_of_line = false;
        self.buffer.push_str(text);

        if text.len() < width {
            self.spaces(width - text.len());
        } else {
            self.spaces(1);
        }
    }

    pub fn u32_left(self: &mut Self, value: u32, width: usize) {
        self.str_left(&value.to_string(), width);
    }

    /// Writes the remaining words on the line separated by single spaces
    pub fn words(self: &mut Self, words: &[String]) {
        self.begining_of_line = false;
        self.buffer.push_str(&words.join(" "));
    }

    fn spaces(self: &mut Self, count: usize) {
        for _ in 0..count {
            self.buffer.push_str(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestData {
        a: String,
        c: u32,
        d: Vec<String>,
    }

    impl ToPlainText for TestData {
        fn to_plain_text(self: &Self, builder: &mut PlainTextBuilder) {
            builder.str_left(&self.a, 6);
            builder.u32_left(self.c, 4);
            builder.words(&self.d);
            builder.new_line();
        }
    }

    #[test]
    fn format_columns() {
        let mut builder = PlainTextBuilder::new();

        TestData { a: String::from("One"), c: 1, d: vec![String::from("x")] }.to_plain_text(&mut builder);
        TestData { a: String::from("Eleven"), c: 11, d: vec![String::from("y"), String::from("z")] }
            .to_plain_text(&mut builder);

        assert_eq!("One   1   x\nEleven 11  y z\n", builder.build());
    }

    #[test]
    fn new_line_is_not_repeated() {
        let mut builder = PlainTextBuilder::new();
        builder.new_line();
        builder.str_left("a", 1);
        builder.new_line();
        builder.new_line();

        assert_eq!(vec![String::from("a")], builder.build_lines());
    }
}
