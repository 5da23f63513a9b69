use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};

use glam::{vec2, Vec2, Vec3};
use tracing::{debug, warn};

use crate::formats::{DecodeError, IStrm, OStrm};
use crate::node::{NodeClass, NodeKind};

/// Messages kept for display, oldest dropped first.
const MSG_CAPACITY: usize = 64;
/// Seconds without a message after which the overlay hides itself.
const HIDE_AFTER: f32 = 30.;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMsg {
	pub display_name: String,
	pub msg: String,
	pub color: Vec3,
}

/// Text to be spoken by an external TTS engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
	pub voice: Option<String>,
	pub text: String,
}

/// Fan-out of chat messages per channel. Cheap to clone and `Send`, so network
/// threads can publish while nodes on the frame thread subscribe.
#[derive(Debug, Clone, Default)]
pub struct ChatHub {
	channels: Arc<Mutex<HashMap<String, Vec<Sender<ChatMsg>>>>>,
}

impl ChatHub {
	pub fn subscribe(&self, channel: &str) -> Receiver<ChatMsg> {
		let (tx, rx) = mpsc::channel();
		let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
		channels.entry(channel.to_owned()).or_default().push(tx);
		rx
	}

	/// Returns how many live subscribers received the message. Dead ones are pruned.
	pub fn publish(&self, channel: &str, msg: ChatMsg) -> usize {
		let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
		let Some(subscribers) = channels.get_mut(channel) else {
			return 0;
		};
		subscribers.retain(|tx| tx.send(msg.clone()).is_ok());
		subscribers.len()
	}
}

/// Chat overlay bound to one channel, named after it.
pub struct Chat {
	pub size: Vec2,
	pub pt_size: i32,
	pub tts: bool,
	/// Chatter name to TTS voice, overriding the hashed pick.
	pub voices_map: BTreeMap<String, String>,

	feed: Option<Receiver<ChatMsg>>,
	msgs: VecDeque<ChatMsg>,
	visible: bool,
	since_last: f32,
	voices: Vec<String>,
	last_name: Option<String>,
	speech: VecDeque<Utterance>,
}

impl Chat {
	pub fn new(feed: Option<Receiver<ChatMsg>>) -> Self {
		Self {
			size: vec2(400., 300.),
			pt_size: 24,
			tts: false,
			voices_map: BTreeMap::new(),
			feed,
			msgs: VecDeque::with_capacity(MSG_CAPACITY),
			visible: false,
			since_last: 0.,
			voices: Vec::new(),
			last_name: None,
			speech: VecDeque::new(),
		}
	}

	pub fn msgs(&self) -> impl DoubleEndedIterator<Item = &ChatMsg> {
		self.msgs.iter()
	}

	pub fn is_visible(&self) -> bool {
		self.visible
	}

	/// Voices offered by the TTS engine.
	pub fn set_voices(&mut self, voices: Vec<String>) {
		self.voices = voices;
	}

	/// Explicit mapping first, otherwise a stable pick from the available voices.
	pub fn voice_for(&self, name: &str) -> Option<&str> {
		if let Some(voice) = self.voices_map.get(name) {
			return Some(voice.as_str());
		}
		if self.voices.is_empty() {
			return None;
		}
		let mut hasher = DefaultHasher::new();
		name.hash(&mut hasher);
		let i = (hasher.finish() ^ 1) % self.voices.len() as u64;
		Some(self.voices[i as usize].as_str())
	}

	pub fn take_speech(&mut self) -> Option<Utterance> {
		self.speech.pop_front()
	}

	pub fn on_msg(&mut self, msg: ChatMsg) {
		self.visible = true;
		self.since_last = 0.;
		if self.tts {
			let utterance = self.speech_line(&msg);
			self.speech.push_back(utterance);
		}
		if self.msgs.len() == MSG_CAPACITY {
			self.msgs.pop_front();
		}
		self.msgs.push_back(msg);
	}

	fn speech_line(&mut self, msg: &ChatMsg) -> Utterance {
		let name = &msg.display_name;
		// consecutive messages from one chatter only name them once
		let suppress_name = self.last_name.as_deref() == Some(name.as_str());
		let text = if suppress_name {
			dedup(&msg.msg)
		} else {
			format!("{} {} {}", escape_name(name), dialog_line(&msg.msg, false), dedup(&msg.msg))
		};
		self.last_name = Some(name.clone());
		Utterance {
			voice: self.voice_for(name).map(str::to_owned),
			text,
		}
	}

	fn load_fields(&mut self, strm: &mut IStrm) -> Result<(), DecodeError> {
		self.size = strm.read()?;
		self.pt_size = strm.read()?;
		self.tts = strm.read()?;
		self.voices_map = strm.read()?;
		Ok(())
	}
}

impl NodeClass for Chat {
	const CLASS_NAME: &'static str = "Chat";
}

impl NodeKind for Chat {
	fn class_name(&self) -> &'static str {
		Self::CLASS_NAME
	}

	/// 1: fields preceded by a redundant class name and node name. 2: fields only.
	fn schema_version(&self) -> u16 {
		2
	}

	fn save(&self, strm: &mut OStrm) {
		strm.write(&self.size);
		strm.write(&self.pt_size);
		strm.write(&self.tts);
		strm.write(&self.voices_map);
	}

	fn load(&mut self, strm: &mut IStrm, version: u16) -> Result<(), DecodeError> {
		if version < 2 {
			let class_name = strm.read::<String>()?;
			let name = strm.read::<String>()?;
			debug!("Skipping legacy chat header {class_name:?} {name:?}");
		}
		self.load_fields(strm)
	}

	fn size(&self) -> Option<Vec2> {
		Some(self.size)
	}

	/// A hidden box lets clicks through to whatever is under it.
	fn is_transparent(&self, _local: Vec2) -> bool {
		!self.visible
	}

	fn update(&mut self, dt: f32) {
		loop {
			let Some(feed) = self.feed.as_ref() else {
				break;
			};
			match feed.try_recv() {
				Ok(msg) => self.on_msg(msg),
				Err(TryRecvError::Empty) => break,
				Err(TryRecvError::Disconnected) => {
					warn!("Chat feed disconnected");
					self.feed = None;
				}
			}
		}

		self.since_last += dt;
		if self.since_last >= HIDE_AFTER {
			self.visible = false;
		}
	}

	any_kind!();
}

/// Underscores read as spaces, trailing digits are dropped: `cool_cat42` is "cool cat".
pub fn escape_name(name: &str) -> String {
	name.replace('_', " ").trim_end_matches(|c: char| c.is_ascii_digit()).to_owned()
}

/// Verb introducing a chatter's line.
pub fn dialog_line(text: &str, is_me: bool) -> &'static str {
	if is_me {
		""
	} else if text.contains('?') || text.starts_with('!') {
		"asked:"
	} else if text.contains('!') {
		"yelled:"
	} else {
		"said:"
	}
}

/// Collapses a word sequence repeated three or more times in a row into one copy.
pub fn dedup(text: &str) -> String {
	let mut words: Vec<&str> = text.split(' ').collect();
	'restart: loop {
		for w in 1..words.len() / 2 {
			for i in 0..words.len() - w {
				let mut copies = 1;
				while i + (copies + 1) * w <= words.len()
					&& words[i..i + w] == words[i + copies * w..i + (copies + 1) * w]
				{
					copies += 1;
				}
				if copies >= 3 {
					words.drain(i + w..i + copies * w);
					continue 'restart;
				}
			}
		}
		break;
	}
	words.join(" ")
}
