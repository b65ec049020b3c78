//! Fixed statements and prompt text for the Information capability

/// Entity lookup, matching by case-sensitive substring.
///
/// Yields one row per relationship type of the first matching node:
/// `label, title, year, relationship, names`.
pub const LOOKUP_QUERY: &str = "\
MATCH (m:Movie|Person)
WHERE m.title CONTAINS $candidate OR m.name CONTAINS $candidate
WITH m LIMIT 1
OPTIONAL MATCH (m)-[r:ACTED_IN|WROTE|DIRECTED|REVIEWED|PRODUCED|FOLLOWS]-(t)
WITH m, type(r) AS relationship, collect(coalesce(t.name, t.title)) AS names
RETURN labels(m)[0] AS label, coalesce(m.title, m.name) AS title, m.released AS year, relationship, names";

/// Entity lookup ignoring letter case.
pub const LOOKUP_QUERY_CASE_INSENSITIVE: &str = "\
MATCH (m:Movie|Person)
WHERE toLower(m.title) CONTAINS toLower($candidate) OR toLower(m.name) CONTAINS toLower($candidate)
WITH m LIMIT 1
OPTIONAL MATCH (m)-[r:ACTED_IN|WROTE|DIRECTED|REVIEWED|PRODUCED|FOLLOWS]-(t)
WITH m, type(r) AS relationship, collect(coalesce(t.name, t.title)) AS names
RETURN labels(m)[0] AS label, coalesce(m.title, m.name) AS title, m.released AS year, relationship, names";

pub const CYPHER_PREFIX: &str = "\
You are a Neo4j expert. Given an input question, create a syntactically correct Cypher query to run.

Here is the schema information {schema}. Use only the provided relationship types and properties in the schema. \
Note: Do not include any explanations or apologies in your responses. \
Do not respond to any questions that might ask anything else than for you to construct a Cypher statement. \
Do not include any text except the generated Cypher statement. \
Do not use any other relationship types or properties that are not provided.

Below are a number of examples of questions and their corresponding Cypher queries.";

pub const CYPHER_SUFFIX: &str = "User input: {question}\nCypher query: ";

pub const EXAMPLE_TEMPLATE: &str = "User input: {question}\nCypher query: {query}";

pub const EXAMPLES: &[(&str, &str)] = &[
    (
        "How many artists are there?",
        "MATCH (a:Person)-[:ACTED_IN]->(:Movie) RETURN count(DISTINCT a)",
    ),
    (
        "Which actors played in the movie Casino?",
        "MATCH (m:Movie {title: 'Casino'})<-[:ACTED_IN]-(a) RETURN a.name",
    ),
    (
        "How many movies has Tom Hanks acted in?",
        "MATCH (a:Person {name: 'Tom Hanks'})-[:ACTED_IN]->(m:Movie) RETURN count(m)",
    ),
    (
        "How many directors are there in the graph?",
        "MATCH (a:Person)-[:DIRECTED]->(:Movie) RETURN count(DISTINCT a)",
    ),
    (
        "Which directors have made movies with at least three different actors named 'John'?",
        "MATCH (d:Person)-[:DIRECTED]->(m:Movie)<-[:ACTED_IN]-(a:Person) WHERE a.name STARTS WITH 'John' WITH d, COUNT(DISTINCT a) AS JohnsCount WHERE JohnsCount >= 3 RETURN d.name",
    ),
    (
        "Identify movies where directors also played a role in the film.",
        "MATCH (p:Person)-[:DIRECTED]->(m:Movie), (p)-[:ACTED_IN]->(m) RETURN m.title, p.name",
    ),
    (
        "Find the actor with the highest number of movies in the database.",
        "MATCH (a:Person)-[:ACTED_IN]->(m:Movie) RETURN a.name, COUNT(m) AS movieCount ORDER BY movieCount DESC LIMIT 1",
    ),
];

pub const QA_PROMPT: &str = "\
You turn database results into a short, natural answer to a question.
The information below was returned by the database and is authoritative: \
never doubt it and never correct it from your own knowledge.
Answer the question directly and do not mention that you were given information.
If the information is empty, say that you don't know the answer.

Example:
Question: Who directed The Matrix?
Information: [{\"p.name\":\"Lana Wachowski\"},{\"p.name\":\"Lilly Wachowski\"}]
Answer: The Matrix was directed by Lana Wachowski and Lilly Wachowski.

Information:
{context}

Question: {question}
Answer:";
