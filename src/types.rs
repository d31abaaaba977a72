#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Truncate, Append }

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirect {
	pub target: Vec<u8>,
	pub typ: RedirectType,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Command {
	pub name: Vec<u8>,
	pub arguments: Vec<Vec<u8>>,
}

impl Command {
	pub fn new<N, I, A>(name: N, arguments: I) -> Command
		where N: Into<Vec<u8>>, I: IntoIterator<Item = A>, A: Into<Vec<u8>> {
		Command { name: name.into(), arguments: arguments.into_iter().map(Into::into).collect() }
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Node {
	Command(Command),
	PipeOperator,
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct CommandLine {
	pub nodes: Vec<Node>,
	pub redirect: Option<Redirect>,
}

impl CommandLine {
	pub fn commands(&self) -> impl Iterator<Item = &Command> {
		self.nodes.iter().filter_map(|node| match *node {
			Node::Command(ref c) => Some(c),
			Node::PipeOperator => None,
		})
	}

	/// True when some command is directly followed by a pipe operator.
	pub fn has_pipes(&self) -> bool {
		self.nodes.windows(2).any(|w| match (&w[0], &w[1]) {
			(&Node::Command(_), &Node::PipeOperator) => true,
			_ => false,
		})
	}

	/// The command when the line consists of exactly one node.
	pub fn sole_command(&self) -> Option<&Command> {
		match self.nodes.as_slice() {
			[Node::Command(c)] => Some(c),
			_ => None,
		}
	}
}
