//! Prompt text sent to the chat providers.

use crate::rchain::provider::ChatMessage;

pub const HELPFUL_ASSISTANT: &str = "You are a helpful assistant.";

pub const KEYWORD_SYSTEM: &str =
    "You will be provided with a block of text, and your task is to extract a list of keywords from it.";

/// Worked examples shown to the model before the real input.
pub const KEYWORD_EXAMPLES: [(&str, &str); 2] = [
    (
        "A flying saucer seen by a guest house, a 7ft alien-like figure coming out of a hedge and a \"cigar-shaped\" UFO near a school yard.\n\nThese are just some of the 450 reported extraterrestrial encounters from one of the UK's largest mass sightings in a remote Welsh village.\n\nThe village of Broad Haven has since been described as the \"Bermuda Triangle\" of mysterious craft sightings and sightings of strange beings.\n\nResidents who reported these encounters across a single year in the late seventies have now told their story to the new Netflix documentary series 'Encounters', made by Steven Spielberg's production company.\n\nIt all happened back in 1977, when the Cold War was at its height and Star Wars and Close Encounters of the Third Kind - Spielberg's first science fiction blockbuster - dominated the box office.",
        "flying saucer, guest house, 7ft alien-like figure, hedge, cigar-shaped UFO, school yard, extraterrestrial encounters, UK, mass sightings, remote Welsh village, Broad Haven, Bermuda Triangle, mysterious craft sightings, strange beings, residents, single year, late seventies, Netflix documentary series, Steven Spielberg, production company, 1977, Cold War, Star Wars, Close Encounters of the Third Kind, science fiction blockbuster, box office.",
    ),
    (
        "Each April, in the village of Maeliya in northwest Sri Lanka, Pinchal Weldurelage Siriwardene gathers his community under the shade of a large banyan tree. The tree overlooks a human-made body of water called a wewa – meaning reservoir or \"tank\" in Sinhala. The wewa stretches out besides the village's rice paddies for 175-acres (708,200 sq m) and is filled with the rainwater of preceding months.\n\nSiriwardene, the 76-year-old secretary of the village's agrarian committee, has a tightly-guarded ritual to perform. By boiling coconut milk on an open hearth beside the tank, he will seek blessings for a prosperous harvest from the deities residing in the tree. \"It's only after that we open the sluice gate to water the rice fields,\" he told me when I visited on a scorching mid-April afternoon.\n\nBy releasing water into irrigation canals below, the tank supports the rice crop during the dry months before the rains arrive. For nearly two millennia, lake-like water bodies such as this have helped generations of farmers cultivate their fields. An old Sinhala phrase, \"wewai dagabai gamai pansalai\", even reflects the technology's centrality to village life; meaning \"tank, pagoda, village and temple\".",
        "April, Maeliya, northwest Sri Lanka, Pinchal Weldurelage Siriwardene, banyan tree, wewa, reservoir, tank, Sinhala, rice paddies, 175-acres, 708,200 sq m, rainwater, agrarian committee, coconut milk, open hearth, blessings, prosperous harvest, deities, sluice gate, rice fields, irrigation canals, dry months, rains, lake-like water bodies, farmers, cultivate, Sinhala phrase, technology, village life, pagoda, temple.",
    ),
];

const QA_SYSTEM: &str = "Use the following pieces of context to answer the user's question.\nIf you don't know the answer, just say that you don't know, don't try to make up an answer.\n----------------\n";

const CONDENSE_TEMPLATE: &str = "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.\n\nChat History:\n";

pub fn keyword_messages(text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2 + KEYWORD_EXAMPLES.len() * 2);
    messages.push(ChatMessage::system(KEYWORD_SYSTEM));
    for (example, keywords) in KEYWORD_EXAMPLES {
        messages.push(ChatMessage::user(example));
        messages.push(ChatMessage::assistant(keywords));
    }
    messages.push(ChatMessage::user(text));
    messages
}

pub fn assistant_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(HELPFUL_ASSISTANT),
        ChatMessage::user(prompt),
    ]
}

/// Context chunks are joined with blank lines into the system prompt.
pub fn qa_messages<'a, I>(context: I, question: &str) -> Vec<ChatMessage>
where
    I: IntoIterator<Item = &'a str>,
{
    let context = context.into_iter().collect::<Vec<_>>().join("\n\n");
    vec![
        ChatMessage::system(format!("{QA_SYSTEM}{context}")),
        ChatMessage::user(question),
    ]
}

pub fn condense_messages(history: &str, question: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "{CONDENSE_TEMPLATE}{history}\nFollow Up Input: {question}\nStandalone question:"
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_conversation_ends_with_the_input() {
        let messages = keyword_messages("The sky is blue.");
        assert_eq!(messages.len(), 6);
        assert!(messages[0].is_system());
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages.last(), Some(&ChatMessage::user("The sky is blue.")));
    }

    #[test]
    fn qa_prompt_stuffs_context_into_the_system_message() {
        let messages = qa_messages(["first chunk", "second chunk"], "What?");
        assert!(messages[0].content.ends_with("first chunk\n\nsecond chunk"));
        assert_eq!(messages[1], ChatMessage::user("What?"));
    }

    #[test]
    fn condense_prompt_includes_history_and_follow_up() {
        let messages = condense_messages("Human: hi\nAssistant: hello", "and then?");
        let content = &messages[0].content;
        assert!(content.contains("Chat History:\nHuman: hi\nAssistant: hello\n"));
        assert!(content.ends_with("Follow Up Input: and then?\nStandalone question:"));
    }
}
