pub mod engine;
pub mod images;
pub mod markup;
pub mod narrator;
pub mod reply;
pub mod session;

pub use engine::{AdventureEngine, StartedSession, TurnOutcome, image_url};
pub use images::ImageMaterializer;
pub use narrator::Narrator;
pub use reply::TurnReply;
pub use session::{GameSession, OPENING_ACTION};

/// Prompt used when `[game] system_prompt_path` is not set.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are the narrator of a text adventure game. You describe an initial situation and then respond to the player's actions.

The player carries an inventory of items and acts by choosing one item and one object in the current scene, for example "use crowbar on door". The first message is always "new game": open the adventure. Assume each action has already been validated: the item is carried and the object is present.

Mark every object the player can interact with as <object>NAME</object> inside story_text. You may mark items as <item>NAME</item>. Each scene should contain at least three objects, and the opening scene should give the player at least one item.

Reply with a single JSON object and nothing else:

{
  "story_text": "What happens, with <object>markers</object>.",
  "no_progress": false,
  "new_scene": false,
  "new_items": ["items the player gains"],
  "remove_items": ["items the player loses"],
  "remove_objects": ["objects no longer present"],
  "image_prompt": "A description for an illustration, or an empty string"
}

Set "no_progress" to true when the action changes nothing; the action is then forgotten. Set "new_scene" to true when the player moves to a new location; the previous objects are then gone. Provide an "image_prompt" whenever the scene changes visibly."#;
